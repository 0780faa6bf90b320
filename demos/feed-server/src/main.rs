//! Simulated feed server.
//!
//! Three producers (posts, comments, users) run concurrently, each with
//! its own latency, and get multiplexed into a single `multipart/mixed`
//! response delivered chunk-by-chunk. The index page joins the records
//! client-side as frames arrive.

mod data;

use std::convert::Infallible;

use axum::body::Body;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use mux_stream::{Boundary, ChannelSink, StreamSession};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mux_stream=debug".into()),
        )
        .init();

    let app = Router::new()
        .route("/", get(index))
        .route("/stream", get(stream));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn stream() -> impl IntoResponse {
    let boundary = Boundary::generate();
    let (sink, rx) = ChannelSink::new(8);

    let session = StreamSession::new(boundary.clone(), sink)
        .producer("posts", data::stream_posts)
        .producer("comments", data::stream_comments)
        .producer("users", data::stream_users);

    // The session outlives this handler; the response body is fed from
    // the sink's receiving end. A client disconnect closes the receiver,
    // which the session sees as a transport error and turns into
    // producer cancellation.
    tokio::spawn(async move {
        match session.run().await {
            Ok(report) => info!(
                frames = report.frames_written,
                bytes = report.bytes_written,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "stream complete"
            ),
            Err(err) => warn!(error = %err, "stream aborted"),
        }
    });

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    (
        [(
            header::CONTENT_TYPE,
            format!("multipart/mixed; boundary={boundary}"),
        )],
        body,
    )
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Streaming feed</title>
  <style>
    body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }
    article { border: 1px solid #ddd; border-radius: 6px; padding: 0.5rem 1rem; margin: 0.5rem 0; }
    #status { color: #666; margin-bottom: 1rem; }
  </style>
</head>
<body>
  <h1>Streaming feed</h1>
  <div id="status">connecting...</div>
  <div id="feed"></div>
<script>
const posts = {}, comments = {}, users = {};

async function run() {
  const res = await fetch('/stream');
  const ct = res.headers.get('Content-Type') || '';
  const boundary = ct.split('boundary=')[1];
  const delim = '--' + boundary;
  const reader = res.body.getReader();
  const decoder = new TextDecoder();
  let buf = '';
  for (;;) {
    const { value, done } = await reader.read();
    if (value) buf += decoder.decode(value, { stream: true });
    for (;;) {
      const start = buf.indexOf(delim);
      if (start < 0) break;
      if (buf.startsWith(delim + '--', start)) {
        document.getElementById('status').textContent = 'complete';
        return;
      }
      const headerEnd = buf.indexOf('\r\n\r\n', start);
      if (headerEnd < 0) break;
      const next = buf.indexOf('\r\n' + delim, headerEnd + 4);
      if (next < 0) break;
      handle(JSON.parse(buf.slice(headerEnd + 4, next)));
      buf = buf.slice(next + 2);
    }
    if (done) break;
  }
  document.getElementById('status').textContent = 'connection ended early';
}

function handle(record) {
  const kind = record.type;
  delete record.type;
  for (const [id, value] of Object.entries(record)) {
    if (kind === 'post') posts[id] = value;
    else if (kind === 'comment') comments[id] = value;
    else if (kind === 'user') users[id] = value;
  }
  render();
}

function render() {
  document.getElementById('status').textContent = 'streaming...';
  document.getElementById('feed').innerHTML = Object.values(posts).map(post => {
    const lines = post.comments.map(cid => {
      const c = comments[cid];
      if (!c) return '<li>loading...</li>';
      const u = users[c.user];
      return '<li>' + c.text + ' (' + (u ? u.name : c.user) + ')</li>';
    }).join('');
    return '<article><h3>' + post.id + ': ' + post.data + '</h3><ul>' + lines + '</ul></article>';
  }).join('');
}

run().catch(err => {
  document.getElementById('status').textContent = 'error: ' + err;
});
</script>
</body>
</html>
"#;
