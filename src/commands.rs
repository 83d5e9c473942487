// CLASSIFICATION: COMMUNITY
// Filename: commands.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Commands API and CyREST verbs.
//!
//! A command line such as `network get attribute network="yeast" columnList="SUID"`
//! becomes `<base>/commands/network/get%20attribute` plus its arguments,
//! either as query parameters (GET) or as a JSON object body (POST).

use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::client::CyClient;
use crate::error::{CyError, CyResult};
use crate::transport::{HttpRequest, Params};

/// Characters left unescaped in a command path.
const COMMAND_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A command line split into its command words and `name=value` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: String,
    pub args: Vec<(String, String)>,
}

fn is_arg_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Split a command line at each unquoted ` name=` boundary.
pub fn split_command(cmd: &str) -> ParsedCommand {
    let mut boundaries = Vec::new();
    let mut in_quotes = false;
    for (i, c) in cmd.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                let rest = &cmd[i + 1..];
                let name_len = rest.find(|c: char| !is_arg_name_char(c)).unwrap_or(rest.len());
                if rest[name_len..].starts_with('=') {
                    boundaries.push(i);
                }
            }
            _ => {}
        }
    }

    let mut segments = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;
    for b in boundaries {
        segments.push(&cmd[start..b]);
        start = b + 1;
    }
    segments.push(&cmd[start..]);

    let command = segments[0].trim().to_string();
    let args = segments[1..]
        .iter()
        .filter_map(|seg| seg.split_once('='))
        .map(|(name, value)| (name.to_string(), value.trim_end().replace('"', "")))
        .collect();
    ParsedCommand { command, args }
}

/// Commands API URL for the command words of `cmd`.
pub fn command_url(base_url: &str, command: &str) -> String {
    let path = if command.is_empty() {
        "/commands".to_string()
    } else {
        format!("/commands/{}", command.replacen(' ', "/", 1))
    };
    format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        utf8_percent_encode(&path, COMMAND_PATH)
    )
}

/// URL and query parameters for a GET command. No arguments gives `None`.
pub fn get_query(base_url: &str, cmd: &str) -> (String, Option<Params>) {
    let parsed = split_command(cmd);
    let params = if parsed.args.is_empty() {
        None
    } else {
        Some(parsed.args.into_iter().collect())
    };
    (command_url(base_url, &parsed.command), params)
}

/// URL and JSON body for a POST command.
pub fn post_query(base_url: &str, cmd: &str) -> (String, Map<String, Value>) {
    let parsed = split_command(cmd);
    let body = parsed
        .args
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    (command_url(base_url, &parsed.command), body)
}

/// Result lines of a text command, without blanks and the `Finished` marker.
pub fn result_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|l| l.trim_start().trim_end_matches('\r'))
        .filter(|l| !l.is_empty() && *l != "Finished")
        .map(str::to_string)
        .collect()
}

/// Help listing lines, header dropped.
pub fn help_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Turn an HTTP failure carrying a CyREST error body into a Cytoscape error.
///
/// CyREST reports failures as `{"errors": [{"message": ...}]}`. With `force`,
/// a non-JSON body becomes the message as-is.
pub fn unwrap_cytoscape_error(err: CyError, operation: &str, force: bool) -> CyError {
    let body = match &err {
        CyError::Http { body, .. } if !body.trim().is_empty() => body.clone(),
        _ => return err,
    };
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["errors"][0]["message"].as_str().map(str::to_string));
    match message {
        Some(message) => CyError::Cytoscape {
            operation: operation.to_string(),
            message,
        },
        None if force => CyError::Cytoscape {
            operation: operation.to_string(),
            message: body,
        },
        None => err,
    }
}

fn body_value(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

impl CyClient {
    fn cyrest(
        &self,
        method: &str,
        operation: &str,
        params: Option<Params>,
        body: Option<Value>,
        op_name: &str,
    ) -> CyResult<Value> {
        let operation = operation.trim_start_matches('/');
        let url = if operation.is_empty() {
            self.config().base_root().to_string()
        } else {
            format!("{}/{operation}", self.config().base_root())
        };
        let mut request = HttpRequest::new(method, url).with_params(params);
        if let Some(body) = body {
            request = request.with_json(body);
        }
        let resp = self.do_request(&request)?;
        resp.raise_for_status()
            .map_err(|e| unwrap_cytoscape_error(e, op_name, false))?;
        Ok(body_value(&resp.text))
    }

    /// GET `<base>/<operation>`; JSON replies are parsed, other text is
    /// returned as a string, an empty body as null.
    pub fn cyrest_get(&self, operation: &str, params: Option<Params>) -> CyResult<Value> {
        self.cyrest("GET", operation, params, None, "cyrest_get")
    }

    pub fn cyrest_post(&self, operation: &str, params: Option<Params>, body: Option<Value>) -> CyResult<Value> {
        self.cyrest("POST", operation, params, body, "cyrest_post")
    }

    pub fn cyrest_put(&self, operation: &str, params: Option<Params>, body: Option<Value>) -> CyResult<Value> {
        self.cyrest("PUT", operation, params, body, "cyrest_put")
    }

    pub fn cyrest_delete(&self, operation: &str, params: Option<Params>) -> CyResult<Value> {
        self.cyrest("DELETE", operation, params, None, "cyrest_delete")
    }

    /// Run a command with GET and return its result lines.
    pub fn commands_get(&self, cmd: &str) -> CyResult<Vec<String>> {
        let (url, params) = get_query(self.config().base_root(), cmd);
        let request = HttpRequest::get(url)
            .with_params(params)
            .with_header("Accept", "text/plain");
        let resp = self.do_request(&request)?;
        resp.raise_for_status()
            .map_err(|e| unwrap_cytoscape_error(e, "commands_get", true))?;
        Ok(result_lines(&resp.text))
    }

    /// Same as [`commands_get`](Self::commands_get).
    pub fn commands_run(&self, cmd: &str) -> CyResult<Vec<String>> {
        self.commands_get(cmd)
    }

    /// List the sub-commands or arguments of `cmd`.
    pub fn commands_help(&self, cmd: &str) -> CyResult<Vec<String>> {
        let cmd = cmd.trim();
        let cmd = match cmd.strip_prefix("help") {
            Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim_start(),
            _ => cmd,
        };
        let (url, params) = get_query(self.config().base_root(), cmd);
        let request = HttpRequest::get(url)
            .with_params(params)
            .with_header("Accept", "text/plain");
        let resp = self.do_request(&request)?;
        resp.raise_for_status()
            .map_err(|e| unwrap_cytoscape_error(e, "commands_help", true))?;
        Ok(help_lines(&resp.text))
    }

    /// Run a command with POST and return the `data` member of its reply.
    pub fn commands_post(&self, cmd: &str) -> CyResult<Value> {
        self.ensure_sandbox()?;
        self.command_post(cmd, "commands_post")
    }

    /// POST a command without touching sandbox initialization.
    pub(crate) fn command_post(&self, cmd: &str, op_name: &str) -> CyResult<Value> {
        let (url, body) = post_query(self.config().base_root(), cmd);
        debug!("{op_name}: {cmd}");
        let request = HttpRequest::post(url)
            .with_json(Value::Object(body))
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json");
        let resp = self.execute(&request)?;
        resp.raise_for_status()
            .map_err(|e| unwrap_cytoscape_error(e, op_name, false))?;
        let mut reply = resp.json()?;
        Ok(reply.get_mut("data").map(Value::take).unwrap_or(Value::Null))
    }
}
