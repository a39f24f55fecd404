//! mpv JSON IPC client used as the playback engine.

use crate::platform::PlaybackEngine;
use async_trait::async_trait;
use multiscreen_common::{Error, PlaybackMode, Result};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tracing::{debug, trace};

/// Commands that queue `locations` in a cleared, paused player.
pub fn load_commands(locations: &[String], mode: PlaybackMode) -> Vec<Value> {
    let mut commands = vec![
        json!(["set_property", "pause", true]),
        json!(["playlist-clear"]),
    ];
    commands.extend(
        locations
            .iter()
            .map(|location| json!(["loadfile", location, "append"])),
    );
    match mode {
        PlaybackMode::Default => commands.push(json!(["set_property", "loop-playlist", "no"])),
        PlaybackMode::Loop => commands.push(json!(["set_property", "loop-playlist", "inf"])),
        PlaybackMode::Shuffle => commands.push(json!(["playlist-shuffle"])),
    }
    commands
}

pub struct MpvEngine {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: Option<OwnedWriteHalf>,
    next_request_id: u64,
    timeout: Duration,
}

impl MpvEngine {
    /// Connect to a player's IPC socket.
    pub async fn connect(socket: &Path, timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, UnixStream::connect(socket))
            .await
            .map_err(|_| Error::engine(format!("timed out connecting to {:?}", socket)))?
            .map_err(|e| Error::engine(format!("failed to connect to {:?}: {e}", socket)))?;

        let (read, write) = stream.into_split();
        debug!("Bound engine to {:?}", socket);
        Ok(Self {
            lines: BufReader::new(read).lines(),
            writer: Some(write),
            next_request_id: 0,
            timeout,
        })
    }

    /// Send one command and wait for its reply.
    async fn command(&mut self, args: Value) -> Result<Value> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::engine("engine already released"))?;

        self.next_request_id += 1;
        let id = self.next_request_id;
        let mut line = json!({ "command": args, "request_id": id }).to_string();
        line.push('\n');
        trace!("mpv <- {}", line.trim_end());

        tokio::time::timeout(self.timeout, writer.write_all(line.as_bytes()))
            .await
            .map_err(|_| Error::engine("timed out writing to mpv"))??;

        tokio::time::timeout(self.timeout, read_reply(&mut self.lines, id))
            .await
            .map_err(|_| Error::engine(format!("mpv did not answer {}", args)))?
    }

    async fn run_all(&mut self, commands: Vec<Value>) -> Result<()> {
        for command in commands {
            self.command(command).await?;
        }
        Ok(())
    }
}

/// Read lines until the reply to `id` arrives, skipping events.
async fn read_reply(lines: &mut Lines<BufReader<OwnedReadHalf>>, id: u64) -> Result<Value> {
    loop {
        let line = lines
            .next_line()
            .await?
            .ok_or_else(|| Error::engine("mpv closed the IPC connection"))?;
        trace!("mpv -> {}", line);

        let message: Value = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                debug!("Ignoring unparseable mpv message: {}", e);
                continue;
            }
        };

        if message.get("event").is_some() {
            continue;
        }
        if message.get("request_id").and_then(Value::as_u64) != Some(id) {
            continue;
        }

        return match message.get("error").and_then(Value::as_str) {
            Some("success") => Ok(message.get("data").cloned().unwrap_or(Value::Null)),
            Some(error) => Err(Error::engine(format!("mpv rejected command: {error}"))),
            None => Err(Error::engine("malformed mpv reply")),
        };
    }
}

#[async_trait]
impl PlaybackEngine for MpvEngine {
    async fn load(&mut self, locations: &[String], mode: PlaybackMode) -> Result<()> {
        self.run_all(load_commands(locations, mode)).await
    }

    async fn play(&mut self) -> Result<()> {
        self.run_all(vec![
            json!(["set_property", "playlist-pos", 0]),
            json!(["set_property", "pause", false]),
        ])
        .await
    }

    async fn request_fullscreen(&mut self) -> Result<()> {
        self.command(json!(["set_property", "fullscreen", true]))
            .await
            .map(|_| ())
    }

    async fn stop(&mut self) -> Result<()> {
        self.command(json!(["stop"])).await.map(|_| ())
    }

    async fn release(&mut self) -> Result<()> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| Error::engine("engine already released"))?;
        writer.shutdown().await?;
        Ok(())
    }
}
