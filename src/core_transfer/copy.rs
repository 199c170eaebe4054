use crate::core_control::CancellationSignal;
use crate::core_transfer::ascii::AsciiTranscoder;
use crate::core_transfer::state::{Direction, TransferState};
use log::{debug, trace};
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Knobs for one paced copy.
#[derive(Debug, Clone)]
pub struct CopyOptions {
    pub ascii: bool,
    /// KiB/s, zero for unlimited.
    pub max_speed_kbps: u32,
    pub min_sleep: Duration,
    pub buffer_size: usize,
}

/// Copies `reader` into `writer` until EOF, counting bytes, pacing to the
/// configured speed and transcoding line endings in ASCII mode.
///
/// A cancellation aborts the copy with `ErrorKind::Interrupted`, also while
/// it is blocked on a stalled stream or pacing. The reason and a wakeup are
/// left for the session loop.
pub async fn copy_paced<R, W>(
    reader: &mut R,
    writer: &mut W,
    direction: Direction,
    options: &CopyOptions,
    signal: &CancellationSignal,
) -> io::Result<TransferState>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut state = TransferState::new(direction);
    let mut transcoder = options.ascii.then(|| match direction {
        Direction::Download => AsciiTranscoder::for_download(),
        Direction::Upload => AsciiTranscoder::for_upload(),
    });
    let mut buffer = vec![0u8; options.buffer_size.max(1)];
    let mut converted = Vec::new();

    loop {
        if signal.is_cancelled() {
            return Err(interrupted());
        }

        let n = cancellable(signal, reader.read(&mut buffer)).await?;
        if n == 0 {
            break;
        }

        match transcoder.as_mut() {
            Some(transcoder) => {
                transcoder.transcode(&buffer[..n], &mut converted);
                cancellable(signal, writer.write_all(&converted)).await?;
            }
            None => cancellable(signal, writer.write_all(&buffer[..n])).await?,
        }

        // Upload speed counts what came off the wire, download what went on it.
        let counted = match (direction, transcoder.is_some()) {
            (Direction::Download, true) => converted.len(),
            _ => n,
        };
        state.add_bytes(counted as u64);
        let pace = state.pace_sleep(options.max_speed_kbps, options.min_sleep);
        cancellable(signal, async {
            pace.await;
            Ok(())
        })
        .await?;
    }

    if let Some(transcoder) = transcoder.as_mut() {
        transcoder.finish(&mut converted);
        if !converted.is_empty() {
            cancellable(signal, writer.write_all(&converted)).await?;
        }
    }
    cancellable(signal, writer.flush()).await?;

    debug!(
        "{} finished: {} bytes in {:?} ({:.2} KiB/s)",
        direction,
        state.bytes(),
        state.elapsed(),
        state.average_speed_kbps()
    );
    Ok(state)
}

fn interrupted() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "transfer cancelled")
}

/// Drives `operation` unless a cancellation arrives first.
///
/// The wakeup consumed here is issued again so the control channel still
/// notices the pending reason.
async fn cancellable<F, T>(signal: &CancellationSignal, operation: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    tokio::pin!(operation);
    loop {
        tokio::select! {
            result = &mut operation => return result,
            _ = signal.wait() => {
                if signal.is_cancelled() {
                    signal.wake();
                    return Err(interrupted());
                }
                trace!("Transfer woken without cancellation");
            }
        }
    }
}
