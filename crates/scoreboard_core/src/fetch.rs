use std::io::BufReader;

use tracing::info;

use crate::error::{EtlError, FetchError, TransformError};
use crate::schema::Snapshot;

/// One blocking GET of the scoreboard feed. No timeout, no retry and no
/// body size limit; any non-2xx status aborts.
pub fn fetch_snapshot(url: &str) -> Result<Snapshot, EtlError> {
    let response = get(url)?;

    // Parsed straight from the stream: a failed read is a fetch error, bad
    // JSON is a transform error.
    let snapshot: Snapshot = match serde_json::from_reader(BufReader::new(response.into_reader())) {
        Ok(snapshot) => snapshot,
        Err(err) if err.is_io() => {
            return Err(FetchError::Body {
                url: url.to_string(),
                source: err.into(),
            }
            .into());
        }
        Err(err) => return Err(TransformError::Malformed(err).into()),
    };

    info!(
        url,
        tick = snapshot.tick,
        teams = snapshot.teams.len(),
        "fetched scoreboard snapshot"
    );
    Ok(snapshot)
}

fn get(url: &str) -> Result<ureq::Response, FetchError> {
    let response = match ureq::get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(status, _)) => {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(FetchError::Transport {
                url: url.to_string(),
                source: Box::new(transport),
            });
        }
    };

    // ureq reports 4xx/5xx as errors and follows redirects, so only 1xx and
    // unfollowed 3xx (304, or a redirect without Location) land here.
    let status = response.status();
    if !(200..300).contains(&status) {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    Ok(response)
}
