//! JSON-lines transport: one message per line in each direction.

use super::{Command, CommandSender, EventReceiver};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Parses commands from `reader` until EOF or until the dispatcher goes
/// away. Malformed lines are logged and skipped.
pub async fn read_commands<R>(reader: R, commands: CommandSender) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Command>(line) {
            Ok(command) => {
                if commands.send(command).is_err() {
                    break;
                }
            }
            Err(e) => log::warn!("[IPC] Ignoring malformed command ({}): {}", e, line),
        }
    }
    Ok(())
}

/// Writes every event to `writer` as it arrives, flushing per line so the
/// UI sees progress immediately.
pub async fn write_events<W>(mut writer: W, mut events: EventReceiver) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::{Event, SelectRole};
    use crate::printer::ProgressEvent;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn reads_valid_lines_and_skips_garbage() {
        let input = concat!(
            "{\"channel\":\"open-screen\",\"payload\":{\"select\":\"frame\"}}\n",
            "not json\n",
            "\n",
            "{\"channel\":\"stop-printing\"}\n",
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        read_commands(input.as_bytes(), tx).await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Command::OpenScreen { select: SelectRole::Frame })
        );
        assert_eq!(rx.recv().await, Some(Command::StopPrinting));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn writes_one_event_per_line() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Event::PrintProgress(ProgressEvent { page: 1, done: false })).unwrap();
        tx.send(Event::PrintProgress(ProgressEvent { page: 2, done: true })).unwrap();
        drop(tx);

        let mut out = Vec::new();
        write_events(&mut out, rx).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            r#"{"channel":"print-progress","payload":{"page":2,"done":true}}"#
        );
    }
}
