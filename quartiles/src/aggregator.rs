use crate::AggregateError;
use latbench_core::{QuantileReport, Sample, SAMPLE_PREFIX};
use std::io::{BufRead, Write};
#[allow(unused)]
use tracing::{debug, trace};

/// Collect every sample line of `input`, echoing all other lines to `echo` as they are read.
///
/// Lines are split on `\n`; a trailing `\r` is dropped. Echoed lines are written byte for byte,
/// so input that is not valid UTF-8 passes through untouched. The first malformed sample payload
/// aborts the scan.
pub fn read_samples<R: BufRead, W: Write>(
    mut input: R,
    mut echo: W,
) -> Result<Vec<Sample>, AggregateError> {
    let mut samples = Vec::new();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let read = input
            .read_until(b'\n', &mut buf)
            .map_err(AggregateError::Read)?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let line = strip_line_ending(&buf);
        match line.strip_prefix(SAMPLE_PREFIX.as_bytes()) {
            Some(payload) => {
                let sample = Sample::from_payload(&String::from_utf8_lossy(payload)).map_err(
                    |source| AggregateError::Parse {
                        line: line_no,
                        source,
                    },
                )?;
                trace!("line {line_no}: {sample}");
                samples.push(sample);
            }
            None => {
                echo.write_all(line)
                    .and_then(|_| echo.write_all(b"\n"))
                    .map_err(AggregateError::Write)?;
            }
        }
    }

    echo.flush().map_err(AggregateError::Write)?;
    debug!("Read {} samples from {line_no} lines", samples.len());

    Ok(samples)
}

/// Scan `input` to the end, then write the quantile report to `output`.
///
/// Non-sample lines reach `output` ahead of the report. Nothing of the report is written on an
/// error.
pub fn aggregate<R: BufRead, W: Write>(
    input: R,
    mut output: W,
) -> Result<QuantileReport, AggregateError> {
    let mut samples = read_samples(input, &mut output)?;
    let report = QuantileReport::from_samples(&mut samples);

    write!(output, "{report}").map_err(AggregateError::Write)?;
    output.flush().map_err(AggregateError::Write)?;

    Ok(report)
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
