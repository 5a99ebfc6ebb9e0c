//! Line-delimited JSON-RPC transport

use serde::{Deserialize, Deserializer, Serialize};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
};

/// JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// `None` only when the member is absent; `"id": null` is a request
    #[serde(default, deserialize_with = "present")]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// JSON-RPC response
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: serde_json::Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// One JSON message per line, in both directions
pub struct LineTransport<R, W> {
    lines: Lines<R>,
    writer: W,
}

impl LineTransport<BufReader<Stdin>, Stdout> {
    /// Transport over the process's stdin/stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: reader.lines(),
            writer,
        }
    }

    /// Read the next non-blank line; `None` on EOF
    ///
    /// Cancel safe: a partially read line stays buffered for the next call.
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        while let Some(line) = self.lines.next_line().await? {
            let line = line.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
        Ok(None)
    }

    /// Write a JSON-RPC response
    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> std::io::Result<()> {
        let json = serde_json::to_string(response)?;
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_are_framed() {
        let input: &[u8] = b"\n{\"a\":1}\n\n{\"b\":2}";
        let mut transport = LineTransport::new(input, Vec::new());

        assert_eq!(transport.read_line().await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(transport.read_line().await.unwrap().as_deref(), Some("{\"b\":2}"));
        assert_eq!(transport.read_line().await.unwrap(), None);
    }

    #[test]
    fn test_null_id_is_not_a_notification() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert_eq!(request.id, Some(serde_json::Value::Null));
        assert!(!request.is_notification());

        let notification: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
        assert_eq!(notification.id, None);
        assert!(notification.is_notification());
    }

    #[tokio::test]
    async fn test_response_is_one_line() {
        let mut transport = LineTransport::new(&b""[..], Vec::new());
        transport
            .write_response(&JsonRpcResponse::success(
                serde_json::json!(1),
                serde_json::json!({}),
            ))
            .await
            .unwrap();

        let out = String::from_utf8(transport.into_writer()).unwrap();
        assert_eq!(out, "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n");
    }
}
