//! SSE manager integration tests against a local HTTP server.

mod support;

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use http_body_util::Full;
use hyper::{Response, body::Bytes};
use restream::{SseConfig, SseEvent, SseHandler, SseManager, TransportError};
use tokio_util::sync::CancellationToken;

fn event_stream_response(body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("content-type", "text/event-stream")
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("response")
}

fn fast_config(url: String) -> SseConfig {
    SseConfig::new(url)
        .retry_interval(Duration::from_millis(10))
        .backoff_jitter(0.0)
}

#[tokio::test]
async fn five_events_then_close_dispatches_exactly_five() {
    let body: String = (1..=5)
        .map(|i| format!("id: {i}\nevent: tick\ndata: payload-{i}\n\n"))
        .collect();

    let requests = Arc::new(AtomicUsize::new(0));
    let server_requests = Arc::clone(&requests);
    let addr = support::spawn_http_server(move |_req| {
        let requests = Arc::clone(&server_requests);
        let body = body.clone();
        async move {
            if requests.fetch_add(1, Ordering::SeqCst) == 0 {
                event_stream_response(&body)
            } else {
                support::status(500)
            }
        }
    })
    .await;

    let messages = Arc::new(AtomicUsize::new(0));
    let opens = Arc::new(AtomicUsize::new(0));
    let seen_messages = Arc::clone(&messages);
    let seen_opens = Arc::clone(&opens);

    let manager = SseManager::new(fast_config(format!("http://{addr}/stream")).max_retries(1))
        .expect("valid config")
        .on_open(move || {
            seen_opens.fetch_add(1, Ordering::SeqCst);
        })
        .on_message(move |event| {
            assert!(event.is_complete());
            assert_eq!(event.event.as_deref(), Some("tick"));
            seen_messages.fetch_add(1, Ordering::SeqCst);
        });

    // The stream opened once, so exhausting the single retry stops cleanly.
    manager
        .run(CancellationToken::new())
        .await
        .expect("clean stop after open");

    assert_eq!(messages.load(Ordering::SeqCst), 5);
    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert_eq!(requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn handler_and_callback_both_fire_per_event() {
    #[derive(Default)]
    struct Counting {
        messages: AtomicUsize,
        opens: AtomicUsize,
    }

    impl SseHandler for Counting {
        fn on_open(&self) {
            self.opens.fetch_add(1, Ordering::SeqCst);
        }
        fn on_message(&self, _event: &SseEvent) {
            self.messages.fetch_add(1, Ordering::SeqCst);
        }
    }

    let requests = Arc::new(AtomicUsize::new(0));
    let server_requests = Arc::clone(&requests);
    let addr = support::spawn_http_server(move |_req| {
        let requests = Arc::clone(&server_requests);
        async move {
            if requests.fetch_add(1, Ordering::SeqCst) == 0 {
                event_stream_response("data: a\n\ndata: b\n\n")
            } else {
                support::status(500)
            }
        }
    })
    .await;

    let callback_count = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&callback_count);
    let handler = Arc::new(Counting::default());

    let manager = SseManager::new(fast_config(format!("http://{addr}/stream")).max_retries(1))
        .expect("valid config")
        .on_message(move |_event| {
            // The inline callback panicking must not shadow the handler.
            counted.fetch_add(1, Ordering::SeqCst);
            panic!("contained");
        })
        .handler(Arc::clone(&handler) as Arc<dyn SseHandler>);

    manager
        .run(CancellationToken::new())
        .await
        .expect("clean stop");

    assert_eq!(callback_count.load(Ordering::SeqCst), 2);
    assert_eq!(handler.messages.load(Ordering::SeqCst), 2);
    assert_eq!(handler.opens.load(Ordering::SeqCst), 1);
    assert_eq!(requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reconnect_sends_last_event_id() {
    let requests = Arc::new(AtomicUsize::new(0));
    let resume_header: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    let server_requests = Arc::clone(&requests);
    let server_header = Arc::clone(&resume_header);
    let addr = support::spawn_http_server(move |req| {
        let requests = Arc::clone(&server_requests);
        let header = Arc::clone(&server_header);
        async move {
            match requests.fetch_add(1, Ordering::SeqCst) {
                0 => event_stream_response("id: evt-7\ndata: first\n\n"),
                1 => {
                    *header.lock().expect("lock") = req
                        .headers()
                        .get("last-event-id")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    event_stream_response("data: resumed\n\n")
                }
                _ => support::status(500),
            }
        }
    })
    .await;

    let messages = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&messages);
    let manager = SseManager::new(fast_config(format!("http://{addr}/stream")).max_retries(2))
        .expect("valid config")
        .on_message(move |_event| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

    manager
        .run(CancellationToken::new())
        .await
        .expect("clean stop");

    assert_eq!(messages.load(Ordering::SeqCst), 2);
    assert_eq!(requests.load(Ordering::SeqCst), 3);
    assert_eq!(
        resume_header.lock().expect("lock").as_deref(),
        Some("evt-7")
    );
}

#[tokio::test]
async fn exhausted_retries_without_open_return_the_error() {
    let addr = support::spawn_http_server(|_req| async { support::status(500) }).await;

    let errors = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&errors);
    let manager = SseManager::new(fast_config(format!("http://{addr}/stream")).max_retries(2))
        .expect("valid config")
        .on_error(move |_error| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

    let result = manager.run(CancellationToken::new()).await;

    assert!(matches!(result, Err(TransportError::Api { .. })));
    assert_eq!(errors.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_field_discards_only_the_current_record() {
    let requests = Arc::new(AtomicUsize::new(0));
    let server_requests = Arc::clone(&requests);
    let addr = support::spawn_http_server(move |_req| {
        let requests = Arc::clone(&server_requests);
        async move {
            if requests.fetch_add(1, Ordering::SeqCst) == 0 {
                event_stream_response("data: doomed\nmystery: boom\n\ndata: survivor\n\n")
            } else {
                support::status(500)
            }
        }
    })
    .await;

    let received: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let manager = SseManager::new(fast_config(format!("http://{addr}/stream")).max_retries(1))
        .expect("valid config")
        .on_message(move |event| {
            if let Some(data) = &event.data {
                sink.lock().expect("lock").push(data.clone());
            }
        });

    manager
        .run(CancellationToken::new())
        .await
        .expect("clean stop");

    assert_eq!(*received.lock().expect("lock"), vec!["survivor".to_string()]);
    assert_eq!(requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancellation_surfaces_as_cancelled() {
    let addr = support::spawn_http_server(|_req| async {
        event_stream_response("data: never-seen\n\n")
    })
    .await;

    let manager =
        SseManager::new(fast_config(format!("http://{addr}/stream"))).expect("valid config");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = manager.run(cancel).await;

    assert!(matches!(result, Err(TransportError::Cancelled)));
}
