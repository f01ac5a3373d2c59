use futures::future::join_all;
use pretend_http::DataObject;
use pretend_http::PretendClient;
use pretend_http::Transport;
use tracing::info;

use crate::cli::Target;

/// Run one lookup per identifier concurrently on a shared client
///
/// All lookups go through the client's gate, so they are throttled together.
/// Results come back in the order of `identifiers`.
pub async fn run_lookups<T: Transport>(client: &PretendClient<T>, target: Target, identifiers: &[String]) -> Vec<(String, pretend_http::Result<DataObject>)> {
    info!(count = identifiers.len(), ?target, "Starting lookups");

    let lookups = identifiers.iter().map(|identifier| async move {
        let arg = target.lookup_arg(identifier);
        let result = match target {
            Target::UserInfo => client.userinfo(arg).await,
            Target::Platform(platform) => client.user(platform, arg).await,
        };
        (identifier.clone(), result)
    });

    join_all(lookups).await
}
