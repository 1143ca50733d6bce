use std::io::{self, Write};

use streamlink_core::{
    common::{logger, types::AnyResult},
    configs::Config,
    plugins::{PluginManager, RealtimeStream, Stream},
};
use tracing::{error, info, warn};

const PIPE_CHUNK: usize = 64 * 1024;

#[tokio::main]
async fn main() -> AnyResult<()> {
    let config = Config::load()?;
    logger::init(&config);

    info!(
        "streamlink-core {} ({}@{})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_BRANCH"),
        env!("GIT_COMMIT")
    );

    let Some(url) = std::env::args().nth(1) else {
        eprintln!("usage: streamlink-core <url>");
        std::process::exit(2);
    };

    let manager = PluginManager::new(&config);
    let Some(plugin) = manager.find(&url) else {
        return Err(format!("no plugin can handle {url} (loaded: {:?})", manager.names()).into());
    };
    info!("Found matching plugin {} for URL {}", plugin.name(), url);

    let streams = plugin.streams(&url).await?;
    if streams.is_empty() {
        warn!("No playable streams found on this URL: {}", url);
        return Ok(());
    }

    let mut realtime = None;
    for (quality, stream) in streams {
        info!("Available stream {}: {}", quality, stream);
        match stream {
            Stream::Realtime(rt) => realtime = realtime.or(Some(rt)),
            other => println!("{quality}\t{}", other.url()),
        }
    }

    let Some(stream) = realtime else {
        return Ok(());
    };

    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    std::thread::Builder::new()
        .name("stdout-pipe".to_string())
        .spawn(move || {
            let _ = done_tx.send(pipe_to_stdout(&stream));
        })?;

    tokio::select! {
        result = done_rx => match result {
            Ok(Ok(total)) => info!("Stream ended after {} bytes", total),
            Ok(Err(e)) => {
                error!("Stream pipe failed: {}", e);
                return Err(e.into());
            }
            Err(_) => warn!("Stream pipe exited without a result"),
        },
        _ = tokio::signal::ctrl_c() => info!("Interrupted, closing stream"),
    }

    Ok(())
}

/// Copies the realtime stream to stdout until it ends.
fn pipe_to_stdout(stream: &RealtimeStream) -> io::Result<u64> {
    let mut reader = stream.open().map_err(io::Error::other)?;
    let mut out = io::stdout().lock();
    let mut total = 0u64;

    loop {
        let chunk = reader.read(PIPE_CHUNK);
        if chunk.is_empty() {
            if reader.is_running() {
                warn!("No data from {} within the read timeout", reader.url());
                continue;
            }
            break;
        }
        out.write_all(&chunk)?;
        total += chunk.len() as u64;
    }

    reader.close();
    out.flush()?;
    Ok(total)
}
