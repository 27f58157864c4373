// ABOUTME: AT command exchange primitives shared by the engine and the transport
// ABOUTME: Request descriptors, collected responses, final result lines and URC groups

pub mod responses;
pub mod tokens;

pub use tokens::Tokens;

/// How many information lines a command is expected to produce
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseArity {
    /// Only a final result code
    None,
    /// One prefixed line, plus a PDU line where the command returns one
    SingleLine,
    /// Any number of prefixed lines
    MultiLine,
}

/// Ctrl-Z, terminating a PDU typed after the `> ` prompt
pub const CTRL_Z: char = '\x1A';

/// A command ready for the transport.
///
/// `prefix` is the tag on the information lines the command answers with,
/// e.g. `+CMGR`; lines with other tags are treated as unsolicited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtRequest {
    pub command: String,
    pub prefix: Option<&'static str>,
    pub arity: ResponseArity,
}

impl AtRequest {
    /// Splits a two-part command such as `AT+CMGS=<len>\r<pdu>^Z\r` into the
    /// command line and the PDU body sent after the prompt. The body keeps its
    /// terminating `^Z\r`.
    pub fn split_pdu(&self) -> Option<(&str, &str)> {
        if !self.command.contains(CTRL_Z) {
            return None;
        }
        let (head, body) = self.command.split_once('\r')?;
        Some((head, body))
    }
}

/// Final result line of an exchange
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FinalResponse {
    Ok,
    Error,
    CmsError(u16),
    CmeError(u16),
    /// No final line arrived in time
    Timeout,
}

impl FinalResponse {
    /// Recognises a final result line, `None` for anything else
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line == "OK" {
            return Some(FinalResponse::Ok);
        }
        if line == "ERROR" {
            return Some(FinalResponse::Error);
        }
        if let Some(cause) = line.strip_prefix("+CMS ERROR:") {
            return Some(FinalResponse::CmsError(cause.trim().parse().unwrap_or(0)));
        }
        if let Some(cause) = line.strip_prefix("+CME ERROR:") {
            return Some(FinalResponse::CmeError(cause.trim().parse().unwrap_or(0)));
        }
        None
    }

    pub fn is_success(&self) -> bool {
        *self == FinalResponse::Ok
    }
}

/// Everything the modem sent in answer to one request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtResponse {
    pub success: bool,
    pub lines: Vec<String>,
    pub final_response: FinalResponse,
}

impl AtResponse {
    pub fn ok<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            success: true,
            lines: lines.into_iter().map(Into::into).collect(),
            final_response: FinalResponse::Ok,
        }
    }

    pub fn failed(final_response: FinalResponse) -> Self {
        Self {
            success: false,
            lines: Vec::new(),
            final_response,
        }
    }

    pub fn timeout() -> Self {
        Self::failed(FinalResponse::Timeout)
    }

    pub fn line(&self, i: usize) -> Option<&str> {
        self.lines.get(i).map(String::as_str)
    }

    /// Numeric cause carried by a `+CMS ERROR`/`+CME ERROR` final line
    pub fn error_cause(&self) -> Option<u16> {
        match self.final_response {
            FinalResponse::CmsError(cause) | FinalResponse::CmeError(cause) => Some(cause),
            _ => None,
        }
    }
}

/// An unsolicited result code with any continuation lines
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrcGroup {
    /// Tag without the colon, e.g. `+CMT`
    pub name: String,
    pub lines: Vec<String>,
}

impl UrcGroup {
    pub fn new<S: Into<String>>(name: &str, lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.to_string(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}
