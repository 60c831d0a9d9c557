use super::normalizer::normalize;
use super::ports::{RelayFrame, RelayStream};
use futures_util::StreamExt;
use inference_providers::{CompletionError, StreamingResult};
use std::future::Future;

/// Logs when a relay is dropped before reaching its terminal frame
struct DisconnectLog {
    frames_sent: usize,
    finished: bool,
}

impl Drop for DisconnectLog {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                frames_sent = self.frames_sent,
                "Client went away mid-stream, releasing upstream connection"
            );
        }
    }
}

/// Re-frame a provider stream as outbound relay frames
///
/// `open` is the not-yet-polled `stream_call` future, so nothing is sent upstream
/// until the first frame is requested. Exactly one terminal frame ends the stream:
/// `Done` after normal exhaustion, or `Error` for a failure at any point (including
/// opening). Nothing is pulled after an error. Dropping the returned stream drops
/// the upstream stream with it.
pub fn relay<F>(open: F) -> RelayStream
where
    F: Future<Output = Result<StreamingResult, CompletionError>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut log = DisconnectLog { frames_sent: 0, finished: false };

        let mut upstream = match open.await {
            Ok(upstream) => upstream,
            Err(e) => {
                log.finished = true;
                yield RelayFrame::Error(normalize(&e));
                return;
            }
        };

        while let Some(item) = upstream.next().await {
            match item {
                Ok(chunk) if chunk.is_empty() => continue,
                Ok(chunk) => {
                    log.frames_sent += 1;
                    yield RelayFrame::Data(chunk.data);
                }
                Err(e) => {
                    log.finished = true;
                    yield RelayFrame::Error(normalize(&e));
                    return;
                }
            }
        }

        tracing::debug!(frames_sent = log.frames_sent, "Stream completed");
        log.finished = true;
        yield RelayFrame::Done;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completions::ports::DomainErrorKind;
    use bytes::Bytes;
    use inference_providers::{
        mock::{MockProvider, MockStep},
        sse_parser::chunk_stream,
        ChatCompletionParams, CompletionChunk, InferenceProvider,
    };
    use std::sync::Arc;

    fn terminal_count(frames: &[RelayFrame]) -> usize {
        frames.iter().filter(|f| f.is_terminal()).count()
    }

    #[tokio::test]
    async fn test_blank_line_and_sentinel() {
        let body: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from_static(b"data: {\"a\":1}\n\ndata: [DONE]\n"))];
        let upstream = chunk_stream(futures_util::stream::iter(body));

        let frames: Vec<RelayFrame> = relay(async move { Ok(upstream) }).collect().await;

        assert_eq!(
            frames,
            vec![RelayFrame::Data(r#"{"a":1}"#.to_string()), RelayFrame::Done]
        );
    }

    #[tokio::test]
    async fn test_mid_stream_failure_after_two_chunks() {
        let mock = Arc::new(MockProvider::new());
        mock.set_stream_steps(vec![
            MockStep::Chunk("one".to_string()),
            MockStep::Chunk("two".to_string()),
            MockStep::Fail(CompletionError::Transport("connection reset".to_string())),
            MockStep::Chunk("never".to_string()),
        ])
        .await;

        let provider = mock.clone();
        let frames: Vec<RelayFrame> = relay(async move {
            provider.stream_call(ChatCompletionParams::default()).await
        })
        .collect()
        .await;

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], RelayFrame::Data("one".to_string()));
        assert_eq!(frames[1], RelayFrame::Data("two".to_string()));
        match &frames[2] {
            RelayFrame::Error(e) => assert_eq!(e.kind, DomainErrorKind::UnknownProvider),
            other => panic!("expected error frame, got {other:?}"),
        }
        assert!(!frames.contains(&RelayFrame::Done));
        assert_eq!(mock.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_open_failure_is_single_error_frame() {
        let frames: Vec<RelayFrame> = relay(async {
            Err(CompletionError::HttpError {
                status_code: 429,
                body: r#"{"error":{"type":"rate_limit_exceeded"}}"#.to_string(),
                retry_after: Some(2),
            })
        })
        .collect()
        .await;

        assert_eq!(frames.len(), 1);
        match &frames[0] {
            RelayFrame::Error(e) => {
                assert_eq!(e.kind, DomainErrorKind::Quota);
                assert_eq!(e.retry_after, Some(2));
            }
            other => panic!("expected error frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_chunks_are_skipped() {
        let items: Vec<Result<CompletionChunk, CompletionError>> = vec![
            Ok(CompletionChunk::new("")),
            Ok(CompletionChunk::new("x")),
            Ok(CompletionChunk::new("")),
        ];
        let upstream: StreamingResult = Box::pin(futures_util::stream::iter(items));

        let frames: Vec<RelayFrame> = relay(async move { Ok(upstream) }).collect().await;

        assert_eq!(
            frames,
            vec![RelayFrame::Data("x".to_string()), RelayFrame::Done]
        );
    }

    #[tokio::test]
    async fn test_exactly_one_terminal_frame() {
        let scripts = vec![
            vec![],
            vec![MockStep::Chunk("a".to_string())],
            vec![MockStep::Fail(CompletionError::Transport("x".to_string()))],
            vec![
                MockStep::Chunk("a".to_string()),
                MockStep::Fail(CompletionError::ProviderError {
                    body: r#"{"error":{"type":"insufficient_quota"}}"#.to_string(),
                }),
            ],
        ];

        for steps in scripts {
            let mock = Arc::new(MockProvider::new());
            mock.set_stream_steps(steps).await;
            let provider = mock.clone();

            let frames: Vec<RelayFrame> = relay(async move {
                provider.stream_call(ChatCompletionParams::default()).await
            })
            .collect()
            .await;

            assert_eq!(terminal_count(&frames), 1);
            assert!(frames.last().unwrap().is_terminal());
        }
    }

    #[tokio::test]
    async fn test_drop_releases_upstream() {
        let mock = Arc::new(MockProvider::new());
        mock.set_stream_steps(vec![MockStep::Chunk("a".to_string()), MockStep::Hang])
            .await;
        let provider = mock.clone();

        let mut frames =
            relay(async move { provider.stream_call(ChatCompletionParams::default()).await });
        assert_eq!(frames.next().await, Some(RelayFrame::Data("a".to_string())));
        assert_eq!(mock.open_streams(), 1);

        drop(frames);
        assert_eq!(mock.open_streams(), 0);
    }
}
