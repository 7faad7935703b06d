// Tokio driver for the client update loop.
//
// One task owns the client. It wakes on an inbound event, the next discard
// deadline, the periodic fade tick, or shutdown, and publishes a fresh
// frame after every wakeup.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use twodays_common::time::{Clock, Micros, SystemClock};
use twodays_common::types::{Document, Keypair, WorkspaceId};

use crate::client::{Client, Frame};
use crate::config::ClientConfig;
use crate::store::backend::MirrorBackend;
use crate::store::memory::MemoryStore;
use crate::store::mirror::Mirror;
use crate::store::mirror_db::MirrorDb;

/// Something that happened outside the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A document delivered by sync.
    Document(Document),
    /// A line typed by the participant.
    Submit(String),
    ThrowLog,
    /// A keypair the identity collaborator accepted.
    SignIn(Keypair),
    SignOut,
    Online(bool),
}

/// Channels connecting the loop to the outside.
pub struct Channels {
    pub inbound: mpsc::Receiver<Inbound>,
    pub frames: watch::Sender<Option<Frame>>,
    pub shutdown: watch::Receiver<bool>,
}

/// Open the mirror at `config.mirror_path` and drive a client until shutdown.
pub async fn run(config: ClientConfig, channels: Channels) -> Result<()> {
    let db = MirrorDb::open(&config.mirror_path).with_context(|| {
        format!("failed to open local mirror at `{}`", config.mirror_path.display())
    })?;
    let clock = SystemClock;
    let mut client = Client::restore(
        Mirror::open(db),
        WorkspaceId::new(config.workspace.as_str()),
        config.rename_display,
        clock.now(),
    );
    if client.session().relays().is_empty() {
        client.set_relays(config.relays.clone());
    }

    info!(workspace = %client.workspace(), "client started");
    let tick = Duration::from_millis(config.tick_interval_ms.max(1));
    drive(&mut client, &clock, tick, channels).await;
    Ok(())
}

/// The select loop. Returns after shutdown with every discard timer cancelled.
pub async fn drive<B: MirrorBackend>(
    client: &mut Client<MemoryStore, B>,
    clock: &impl Clock,
    tick: Duration,
    mut channels: Channels,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut inbound_open = true;

    loop {
        let deadline = sleep_until_deadline(client.next_deadline(), clock);

        tokio::select! {
            biased;

            changed = channels.shutdown.changed() => {
                if changed.is_err() || *channels.shutdown.borrow() {
                    info!("client loop shutting down");
                    break;
                }
            }

            maybe_inbound = channels.inbound.recv(), if inbound_open => {
                match maybe_inbound {
                    Some(inbound) => apply(client, inbound, clock),
                    None => {
                        debug!("inbound channel closed");
                        inbound_open = false;
                    }
                }
            }

            _ = deadline => {
                debug!("discard deadline reached");
            }

            _ = interval.tick() => {}
        }

        let frame = client.tick(clock.now());
        channels.frames.send_replace(Some(frame));
    }

    client.teardown();
}

fn apply<B: MirrorBackend>(
    client: &mut Client<MemoryStore, B>,
    inbound: Inbound,
    clock: &impl Clock,
) {
    let now = clock.now();
    match inbound {
        Inbound::Document(document) => {
            if let Err(error) = client.ingest(document) {
                debug!(%error, "remote document not applied");
            }
        }
        Inbound::Submit(text) => {
            if let Err(error) = client.submit(&text, now) {
                warn!(%error, "submission rejected");
            }
        }
        Inbound::ThrowLog => {
            if let Err(error) = client.throw_log(now) {
                warn!(%error, "log not thrown");
            }
        }
        Inbound::SignIn(keypair) => client.sign_in(keypair),
        Inbound::SignOut => client.sign_out(),
        Inbound::Online(online) => client.set_online(online),
    }
}

fn sleep_until_deadline(
    deadline: Option<Micros>,
    clock: &impl Clock,
) -> impl Future<Output = ()> {
    let delay = deadline.map(|at| {
        let millis = (at.to_millis() - clock.now()).0.max(0);
        Duration::from_millis(u64::try_from(millis).unwrap_or_default())
    });
    async move {
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
    }
}
