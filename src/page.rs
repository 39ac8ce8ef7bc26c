use crate::view::{FormValues, ViewState, IDLE_MESSAGE};
use minijinja::{context, Environment};
use serde_json::Value;

const INDEX_TEMPLATE: &str = "index.html";

/// Renders the single HTML page for every view state.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(INDEX_TEMPLATE, include_str!("../templates/index.html"))?;
        Ok(Self { env })
    }

    pub fn render(&self, form: &FormValues, state: &ViewState) -> Result<String, minijinja::Error> {
        let template = self.env.get_template(INDEX_TEMPLATE)?;

        let (dashboard, figure, failure) = match state {
            ViewState::Idle => (None, Value::Null, None),
            ViewState::Loaded(dashboard) => (Some(&**dashboard), dashboard.chart.to_plotly(), None),
            ViewState::Failed { message, detail } => (
                None,
                Value::Null,
                Some(context! { message => message, detail => detail }),
            ),
        };

        template.render(context! {
            form => form,
            state => state.name().as_str(),
            idle_message => IDLE_MESSAGE,
            dashboard => dashboard,
            figure => figure,
            failure => failure,
        })
    }
}
