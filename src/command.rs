//! The text commands understood by tablet servers and the coordinator, and the status lines
//! sent back for them.
use std::fmt;

use crate::error::{Result, TabletError};

/// reason sent when a row or column does not exist
pub const NOT_FOUND: &str = "Resource Does Not Exist";
/// reason sent when a PUT could not create its row
pub const CREATION_FAILED: &str = "Resource Creation Failed";
/// reason sent when a command line could not be parsed
pub const PARSER_FAILURE: &str = "Parser Failure";
/// reason sent when a node receives a command it does not serve
pub const UNSUPPORTED: &str = "Unsupported Command";
/// reason sent when the store failed unexpectedly
pub const INTERNAL_FAILURE: &str = "Internal Failure";

/// A summary of the data commands, printed for the user when a line cannot be parsed
pub const USAGE: &str = "1) GET <row> <col>\n2) PUT <row> <col> <bytes>\n3) DEL <row> <col>";

/// These are the request "commands" that can be sent to a tablet server or to the coordinator.
///
/// On the wire every command is one line:
///
/// ```text
/// GET <row> <col>
/// PUT <row> <col> <bytes to the end of the line>
/// DEL <row> <col>
/// LOOKUP <row>
/// DIRECTORY
/// PING <index>
/// EXIT
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// get a blob from a tablet
    Get {
        /// the row to read
        row: String,
        /// the column within the row
        col: String,
    },
    /// store a blob in a tablet
    Put {
        /// the row to write
        row: String,
        /// the column within the row
        col: String,
        /// the blob, everything after the column up to the end of the line
        value: Vec<u8>,
    },
    /// remove a blob from a tablet
    Del {
        /// the row to remove from
        row: String,
        /// the column within the row
        col: String,
    },
    /// ask the coordinator which tablet server holds `row`
    Lookup {
        /// the row to locate
        row: String,
    },
    /// ask the coordinator for its complete placement directory
    Directory,
    /// a heartbeat from tablet server `index`
    Ping {
        /// node index of the sender
        index: usize,
    },
    /// close the connection
    Exit,
}

impl Request {
    /// Parses one command line, without its delimiter.
    ///
    /// # Errors
    /// returns [`TabletError::Parsing`] if the method is unknown, a key is missing, empty or not
    /// valid UTF-8, or there are unexpected trailing arguments
    pub fn parse(line: &[u8]) -> Result<Request> {
        let (method, rest) = split_token(line);
        match method {
            b"GET" | b"DEL" => {
                let (row, rest) = next_key(rest)?;
                let (col, rest) = next_key(rest)?;
                no_more_args(rest)?;
                if method == b"GET" {
                    Ok(Request::Get { row, col })
                } else {
                    Ok(Request::Del { row, col })
                }
            }
            b"PUT" => {
                let (row, rest) = next_key(rest)?;
                let (col, rest) = next_key(rest)?;
                let value = rest
                    .ok_or_else(|| TabletError::Parsing("PUT is missing its value".to_string()))?;
                Ok(Request::Put {
                    row,
                    col,
                    value: value.to_vec(),
                })
            }
            b"LOOKUP" => {
                let (row, rest) = next_key(rest)?;
                no_more_args(rest)?;
                Ok(Request::Lookup { row })
            }
            b"PING" => {
                let (index, rest) = next_key(rest)?;
                no_more_args(rest)?;
                let index = index
                    .parse::<usize>()
                    .map_err(|_| TabletError::Parsing(format!("invalid node index: {}", index)))?;
                Ok(Request::Ping { index })
            }
            b"DIRECTORY" => {
                no_more_args(rest)?;
                Ok(Request::Directory)
            }
            b"EXIT" => {
                no_more_args(rest)?;
                Ok(Request::Exit)
            }
            other => Err(TabletError::Parsing(format!(
                "unknown command: {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Checks that this request can be written as a single command line: keys must be
    /// non-empty and free of spaces and line breaks, values free of line breaks.
    pub fn validate(&self) -> Result<()> {
        match self {
            Request::Get { row, col } | Request::Del { row, col } => {
                check_key(row)?;
                check_key(col)
            }
            Request::Put { row, col, value } => {
                check_key(row)?;
                check_key(col)?;
                if value.contains(&b'\r') || value.contains(&b'\n') {
                    return Err(TabletError::Parsing(
                        "values cannot contain line breaks".to_string(),
                    ));
                }
                Ok(())
            }
            Request::Lookup { row } => check_key(row),
            Request::Directory | Request::Ping { .. } | Request::Exit => Ok(()),
        }
    }

    /// encodes this request as a command line, without a delimiter
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Request::Get { row, col } => format!("GET {} {}", row, col).into_bytes(),
            Request::Put { row, col, value } => {
                let mut line = format!("PUT {} {} ", row, col).into_bytes();
                line.extend_from_slice(value);
                line
            }
            Request::Del { row, col } => format!("DEL {} {}", row, col).into_bytes(),
            Request::Lookup { row } => format!("LOOKUP {}", row).into_bytes(),
            Request::Directory => b"DIRECTORY".to_vec(),
            Request::Ping { index } => format!("PING {}", index).into_bytes(),
            Request::Exit => b"EXIT".to_vec(),
        }
    }
}

/// The responses returned for any Request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// the request succeeded, optionally carrying a payload (`+250 OK [payload]`)
    Ok(Option<Vec<u8>>),
    /// the connection is about to be closed (`+950 GOODBYE`)
    Goodbye,
    /// the request failed (`-550 <reason>`)
    Err(String),
}

impl Response {
    /// a failure response with the given reason
    pub fn err(reason: &str) -> Self {
        Response::Err(reason.to_string())
    }

    /// encodes this response as a status line, without a delimiter
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::Ok(None) => b"+250 OK".to_vec(),
            Response::Ok(Some(payload)) => {
                let mut line = b"+250 OK ".to_vec();
                line.extend_from_slice(payload);
                line
            }
            Response::Goodbye => b"+950 GOODBYE".to_vec(),
            Response::Err(reason) => format!("-550 {}", reason).into_bytes(),
        }
    }

    /// parses a status line, without its delimiter
    pub fn parse(line: &[u8]) -> Result<Response> {
        if line == b"+250 OK" {
            Ok(Response::Ok(None))
        } else if let Some(payload) = line.strip_prefix(b"+250 OK ") {
            Ok(Response::Ok(Some(payload.to_vec())))
        } else if line == b"+950 GOODBYE" {
            Ok(Response::Goodbye)
        } else if let Some(reason) = line.strip_prefix(b"-550 ") {
            Ok(Response::Err(String::from_utf8_lossy(reason).into_owned()))
        } else {
            Err(TabletError::Parsing(format!(
                "invalid response: {}",
                String::from_utf8_lossy(line)
            )))
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_bytes()))
    }
}

/// splits `input` at its first space into the token before it and, if there was a space, the
/// remainder after it
fn split_token(input: &[u8]) -> (&[u8], Option<&[u8]>) {
    match input.iter().position(|b| *b == b' ') {
        Some(pos) => (&input[..pos], Some(&input[pos + 1..])),
        None => (input, None),
    }
}

/// takes the next key out of `rest`
fn next_key(rest: Option<&[u8]>) -> Result<(String, Option<&[u8]>)> {
    let rest = rest.ok_or_else(|| TabletError::Parsing("missing argument".to_string()))?;
    let (token, rest) = split_token(rest);
    if token.is_empty() {
        return Err(TabletError::Parsing("empty argument".to_string()));
    }
    let key = std::str::from_utf8(token)
        .map_err(|_| TabletError::Parsing("arguments must be valid UTF-8".to_string()))?;
    Ok((key.to_string(), rest))
}

fn no_more_args(rest: Option<&[u8]>) -> Result<()> {
    match rest {
        None => Ok(()),
        Some(extra) => Err(TabletError::Parsing(format!(
            "unexpected arguments: {}",
            String::from_utf8_lossy(extra)
        ))),
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains(|c: char| c == ' ' || c == '\r' || c == '\n') {
        return Err(TabletError::Parsing(format!(
            "keys must be non-empty and cannot contain spaces or line breaks: {:?}",
            key
        )));
    }
    Ok(())
}
