//! Newline-delimited JSON replay
//!
//! Each input line is either a control command
//! (`{"command": "start_calibration"}`) or a recorded observation, optionally
//! carrying the raw audio chunks captured since the previous frame.

use anyhow::Context;
use capture::{AudioLevelBuffer, ObservationSlot};
use proctor_core::{Observation, RiskLevel};
use serde::{Deserialize, Serialize};
use session::{SessionController, SessionState};
use std::collections::BTreeMap;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Session control verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    StartCalibration,
    StopCalibration,
    Stop,
}

/// Recorded frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    #[serde(flatten)]
    pub observation: Observation,

    /// Raw audio captured since the previous frame
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_chunks: Vec<Vec<f32>>,
}

/// One line of replay input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplayLine {
    Command { command: ControlCommand },
    Frame(ReplayRecord),
}

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Begin calibrating before the first line
    pub auto_start: bool,
    /// Write every tick report instead of risk events only
    pub emit_ticks: bool,
}

/// Totals for one replay run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub frames: usize,
    pub commands: usize,
    pub monitoring_ticks: usize,
    pub events: usize,
    pub events_by_level: BTreeMap<RiskLevel, usize>,
    pub highest_level: Option<RiskLevel>,
    pub rejected_chunks: usize,
    pub skipped_frames: usize,
    pub final_state: SessionState,
}

/// Replay every line from `input`, writing JSON lines to `output`
pub async fn replay<R, W>(
    controller: &mut SessionController,
    input: R,
    output: &mut W,
    options: &ReplayOptions,
) -> anyhow::Result<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let slot = ObservationSlot::new();
    let audio = AudioLevelBuffer::new(&controller.config().audio)?;
    let mut summary = ReplaySummary::default();
    let mut last_seq = 0;

    if options.auto_start {
        controller.start_calibration();
    }

    let mut lines = input.lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await.context("reading replay input")? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed: ReplayLine = serde_json::from_str(line)
            .with_context(|| format!("line {}: invalid replay record", line_no))?;

        let record = match parsed {
            ReplayLine::Command { command } => {
                summary.commands += 1;
                apply(controller, command);
                continue;
            }
            ReplayLine::Frame(record) => record,
        };

        for chunk in &record.audio_chunks {
            if let Err(e) = audio.push_chunk(chunk) {
                warn!("line {}: audio chunk rejected: {}", line_no, e);
                summary.rejected_chunks += 1;
            }
        }
        slot.publish(record.observation)?;

        let Some((seq, mut observation)) = slot.take_if_newer(last_seq)? else {
            continue;
        };
        last_seq = seq;

        if !record.audio_chunks.is_empty() {
            observation.audio = Some(audio.drain()?);
        }

        let report = controller.step(&observation);
        summary.frames += 1;
        if report.state == SessionState::Monitoring && report.calibration.is_none() {
            summary.monitoring_ticks += 1;
        }

        if let Some(event) = &report.event {
            summary.events += 1;
            *summary.events_by_level.entry(event.level).or_default() += 1;
            summary.highest_level = summary.highest_level.max(Some(event.level));
        }

        if options.emit_ticks {
            writeln!(output, "{}", serde_json::to_string(&report)?)?;
        } else if let Some(event) = &report.event {
            writeln!(output, "{}", serde_json::to_string(event)?)?;
        }
    }

    output.flush()?;
    summary.skipped_frames = slot.dropped();
    summary.final_state = controller.state();

    info!(
        "Replay finished: {} frames, {} events {:?}, final state {}",
        summary.frames, summary.events, summary.events_by_level, summary.final_state
    );
    Ok(summary)
}

fn apply(controller: &mut SessionController, command: ControlCommand) {
    debug!("Replay command: {:?}", command);
    match command {
        ControlCommand::StartCalibration => controller.start_calibration(),
        ControlCommand::StopCalibration => controller.stop_calibration(),
        ControlCommand::Stop => controller.stop(),
    }
}
