//! Newline-delimited JSON transport for the boundary: one `BoundaryMessage`
//! per line.

use anyhow::{Context, Result};
use shared::protocol::BoundaryMessage;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
};
use tracing::{debug, warn};

/// Forwards every decodable line of `reader` to `inbound` until EOF or until
/// the receiving side goes away.
pub async fn pump_inbound<R>(reader: R, inbound: UnboundedSender<BoundaryMessage>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await.context("failed to read boundary input")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<BoundaryMessage>(line) {
            Ok(message) => {
                if inbound.send(message).is_err() {
                    debug!("stdio: inbound receiver dropped");
                    break;
                }
            }
            Err(err) => warn!(error = %err, "stdio: invalid boundary line skipped"),
        }
    }
    debug!("stdio: boundary input closed");
    Ok(())
}

/// Writes outbound messages to `writer`, flushing after each line.
pub async fn pump_outbound<W>(
    mut writer: W,
    mut outbound: UnboundedReceiver<BoundaryMessage>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        writer
            .write_all(&line)
            .await
            .context("failed to write boundary output")?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn reads_one_message_per_line_skipping_noise() {
        let input = concat!(
            "{\"topic\":\"command\",\"args\":[\"about\"]}\n",
            "\n",
            "not json\n",
            "   {\"topic\":\"window-reloading\"}   \n",
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        pump_inbound(input.as_bytes(), tx).await.expect("pump");

        let first = rx.recv().await.expect("first");
        assert_eq!(first, BoundaryMessage::new("command", vec![json!("about")]));
        let second = rx.recv().await.expect("second");
        assert_eq!(second.topic, "window-reloading");
        assert!(second.args.is_empty());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn stops_reading_when_nobody_listens() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        pump_inbound("{\"topic\":\"command\",\"args\":[\"about\"]}\n".as_bytes(), tx)
            .await
            .expect("pump");
    }

    #[tokio::test]
    async fn writes_newline_terminated_json() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(BoundaryMessage::new("window-state-request", vec![]))
            .expect("send");
        tx.send(BoundaryMessage::new(
            "current-tabs-count",
            vec![json!(4), json!(false), json!(2)],
        ))
        .expect("send");
        drop(tx);

        let mut written = Vec::new();
        pump_outbound(&mut written, rx).await.expect("pump");
        let text = String::from_utf8(written).expect("utf8");
        assert_eq!(
            text,
            "{\"topic\":\"window-state-request\",\"args\":[]}\n\
             {\"topic\":\"current-tabs-count\",\"args\":[4,false,2]}\n"
        );
    }
}
