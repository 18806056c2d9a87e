use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use itertools::Itertools;
use serde::Serialize;
use serde_json::json;

use crate::simulator::TrialRun;
use crate::utils::prelude::*;

/// Write `value` as 2-space indented JSON followed by a newline
pub fn write_json(mut writer: impl io::Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write `value` to `path`, or to stdout when there is no path
pub fn emit_json(path: Option<&Path>, value: &impl Serialize) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            info!(path = %path.display(), "writing report");
            write_json(BufWriter::new(file), value)
        }
        None => {
            let stdout = io::stdout();
            let lock = stdout.lock();
            write_json(lock, value)
        }
    }
}

fn event_line(writer: impl io::Write, val: serde_json::Value) -> Result<()> {
    event_line_with_ending(writer, val, true)
}

fn event_line_with_ending(mut writer: impl io::Write, val: serde_json::Value, ending: bool) -> Result<()> {
    serde_json::to_writer(&mut writer, &val)?;
    if ending {
        writer.write_all(b",\n")?;
    }
    Ok(())
}

/// Render a trial as a chrome://tracing document, one thread per worker.
///
/// `metadata` is stored next to the events under `"trial"`.
pub fn render_chrome_trace(writer: impl io::Write, run: &TrialRun, metadata: &impl Serialize) -> Result<()> {
    let mut file = writer;
    file.write_all(b"{\"traceEvents\":[\n")?;

    let mut evaluated = 0;
    for evaluation in run.trace.iter() {
        event_line(
            &mut file,
            json!({
                "name": format!("Item {}", evaluation.item),
                "ph": "X",
                "cat": "eval",
                "ts": evaluation.started,
                "dur": evaluation.finished.0 - evaluation.started.0,
                "pid": 0,
                "tid": evaluation.worker,
                "args": {
                    "item": evaluation.item,
                    "fitness": evaluation.fitness,
                }
            }),
        )?;
        evaluated += 1;
        event_line(
            &mut file,
            json!({
                "name": "Evaluated",
                "ph": "C",
                "cat": "progress",
                "ts": evaluation.finished,
                "pid": 0,
                "args": {
                    "evaluated": evaluated,
                }
            }),
        )?;
    }

    for (worker, count) in run.per_worker.iter().enumerate() {
        event_line(
            &mut file,
            json!({
                "name": "thread_name",
                "ph": "M",
                "pid": 0,
                "tid": worker,
                "args": {
                    "name": format!("Worker {} ({} evals)", worker, count)
                }
            }),
        )?;
    }
    event_line_with_ending(
        &mut file,
        json!({
            "name": "process_name",
            "ph": "M",
            "pid": 0,
            "args": {
                "name": format!("Workers [{}]", run.per_worker.iter().join(", "))
            }
        }),
        false,
    )?;
    file.write_all(b"\n],\"trial\":")?;
    serde_json::to_writer(&mut file, metadata)?;
    file.write_all(b"\n}")?;
    file.flush()?;
    Ok(())
}

pub fn write_chrome_trace(path: &Path, run: &TrialRun, metadata: &impl Serialize) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    info!(path = %path.display(), "writing chrome trace");
    render_chrome_trace(BufWriter::new(file), run, metadata)
}
