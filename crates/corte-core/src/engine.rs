use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::acquire::GrayFrame;
use crate::analysis::Analysis;
use crate::detector::{DetectorError, FaceDetector};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("engine thread exited")]
    ChannelClosed,
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Messages sent from callers to the engine thread.
enum EngineRequest {
    Analyze {
        frame: GrayFrame,
        reply: oneshot::Sender<Result<Analysis, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Request analysis: detect faces in the frame, classify the first one.
    ///
    /// The frame is consumed and dropped on the engine thread once detection ends.
    pub async fn analyze(&self, frame: GrayFrame) -> Result<Analysis, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Analyze {
                frame,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Spawn the engine on a dedicated OS thread that owns the detector.
///
/// The thread exits once every [`EngineHandle`] has been dropped.
pub fn spawn_engine<D>(detector: D) -> Result<EngineHandle, EngineError>
where
    D: FaceDetector + 'static,
{
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);
    let mut detector = detector;

    std::thread::Builder::new()
        .name("corte-engine".into())
        .spawn(move || {
            tracing::debug!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Analyze { frame, reply } => {
                        let result = run_analyze(&mut detector, frame);
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::debug!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}

fn run_analyze<D: FaceDetector>(
    detector: &mut D,
    frame: GrayFrame,
) -> Result<Analysis, EngineError> {
    tracing::debug!(
        width = frame.width,
        height = frame.height,
        "analyze: running detector"
    );
    let faces = detector.detect(&frame)?;
    drop(frame);
    Ok(Analysis::from_faces(&faces))
}
