//! # stockview
//!
//! Looks up daily price history for one ticker over a date range and serves
//! it as a small web page: key metric cards, a candlestick chart, the raw
//! table and a CSV download.
//!
//! Each request runs the whole pipeline once: validate the query, fetch from
//! the market-data provider, build the widgets, render.

pub mod api;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod page;
pub mod presenter;
pub mod provider;
pub mod view;
pub mod yahoo;
