//! CLI commands
//!
//! Every command runs against an already initialized engine and reports
//! the `Set-Cookie` deletion headers and tag-manager signals it produced.

pub mod consent;
pub mod inventory;

use serde::Serialize;

use cookiegate_core::SignalCall;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Command output plus the side effects the host must forward
#[derive(Debug, Serialize)]
pub struct Response<T> {
    #[serde(flatten)]
    pub body: T,
    pub set_cookie: Vec<String>,
    pub signals: Vec<SignalCall>,
}

/// Plain-text rendering for terminal output
pub trait Render {
    fn render(&self) -> String;
}

pub fn emit<T>(state: &AppState, json: bool, body: T) -> anyhow::Result<()>
where
    T: Serialize + Render,
{
    let response = Response {
        body,
        set_cookie: state.set_cookie_headers(),
        signals: state.take_signals(),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&CommandResult::ok(response))?
        );
        return Ok(());
    }

    let text = response.body.render();
    if !text.is_empty() {
        println!("{}", text);
    }
    for header in &response.set_cookie {
        println!("Set-Cookie: {}", header);
    }
    for signal in &response.signals {
        println!("signal: {}", render_signal(signal));
    }

    Ok(())
}

fn render_signal(signal: &SignalCall) -> String {
    match signal {
        SignalCall::ConsentUpdate { update } => update
            .signals()
            .map(|(signal, state)| format!("{}={}", json_name(signal), json_name(state)))
            .collect::<Vec<_>>()
            .join(" "),
        SignalCall::Flag { name, value } => format!("{}={}", name, value),
    }
}

fn json_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookiegate_core::{ConsentUpdate, SignalCategory};

    #[test]
    fn test_render_signal() {
        let update = SignalCall::ConsentUpdate {
            update: ConsentUpdate::for_category(SignalCategory::Analytics, false),
        };
        assert_eq!(render_signal(&update), "analytics_storage=denied");

        let flag = SignalCall::Flag {
            name: "ga-disable-G-1".to_string(),
            value: true,
        };
        assert_eq!(render_signal(&flag), "ga-disable-G-1=true");
    }
}
