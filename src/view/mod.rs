// src/view/mod.rs
//
// Per-view fetch-on-display orchestration. Each view owns one slot: one
// snapshot, one in-flight fetch, one load state. Replacing a view aborts
// its fetch and bumps the slot generation, so a late response can never
// overwrite the snapshot of a view that is no longer active.

use std::fmt;
use std::future::Future;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use anyhow::Result;
use reqwest::Client;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::config::{Config, SHEET_DETAILS, SHEET_OVERVIEW, SHEET_TOUCHPOINTS};
use crate::fetch::{refresh, sheets, Envelope};
use crate::parse::{
    parse_detail, parse_overview, parse_touchpoints, DetailSheet, OverviewReport, TouchpointRow,
};
use crate::render;

/// The one user-visible message for any failed view fetch.
pub const DATA_UNAVAILABLE: &str = "Impossibile caricare i dati";

const LOADING: &str = "⏳ Caricamento...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Overview,
    Touchpoints,
    Details,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            View::Overview => "Panoramica",
            View::Touchpoints => "Touchpoint",
            View::Details => "Dettagli",
        })
    }
}

/// Load state of one view's data snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

/// Owner of one view's snapshot and its single in-flight fetch.
///
/// A result commits only if the generation recorded when the fetch was
/// spawned is still current. `close` (and a subsequent `open`) both abort
/// the running task and advance the generation, so even a task that raced
/// past the abort cannot commit a stale snapshot.
pub struct ViewSlot<T> {
    state: Arc<Mutex<LoadState<T>>>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> ViewSlot<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LoadState::Idle)),
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Start the view's fetch, cancelling any previous one. `done`
    /// receives `view` after a result (success or failure) commits.
    pub fn open<F>(&mut self, view: View, load: F, done: mpsc::Sender<View>)
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        self.cancel();
        let state = Arc::clone(&self.state);
        let generation = Arc::clone(&self.generation);
        let current = generation.load(Ordering::SeqCst);
        *self.state.lock().unwrap() = LoadState::Loading;
        self.task = Some(tokio::spawn(async move {
            let outcome = load.await;
            if generation.load(Ordering::SeqCst) != current {
                debug!(%view, "dropping result of a cancelled fetch");
                return;
            }
            *state.lock().unwrap() = match outcome {
                Ok(snapshot) => LoadState::Ready(snapshot),
                Err(err) => {
                    error!(%view, error = %err, "view fetch failed");
                    LoadState::Failed(DATA_UNAVAILABLE.to_string())
                }
            };
            let _ = done.send(view).await;
        }));
    }

    /// Abort the in-flight fetch, if any, and drop the snapshot.
    pub fn close(&mut self) {
        self.cancel();
        *self.state.lock().unwrap() = LoadState::Idle;
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Inspect the current load state.
    pub fn read<R>(&self, inspect: impl FnOnce(&LoadState<T>) -> R) -> R {
        inspect(&self.state.lock().unwrap())
    }
}

impl<T: Send + 'static> Default for ViewSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn render_state<T: Send + 'static>(
    slot: &ViewSlot<T>,
    render: impl Fn(&T) -> String,
) -> String {
    slot.read(|state| match state {
        LoadState::Ready(snapshot) => render(snapshot),
        LoadState::Failed(message) => format!("{message}\n"),
        LoadState::Loading => format!("{LOADING}\n"),
        LoadState::Idle => String::new(),
    })
}

const HELP: &str = "[1] Panoramica  [2] Touchpoint  [3] Dettagli  [r] Aggiorna  [q] Esci";

/// Interactive tab session: one slot per view, fetch on first display,
/// refetch on every switch back. The refresh action is independent of the
/// view fetches and never touches their snapshots.
pub struct Tabs {
    client: Client,
    config: Config,
    overview: ViewSlot<OverviewReport>,
    touchpoints: ViewSlot<Vec<TouchpointRow>>,
    details: ViewSlot<DetailSheet>,
}

impl Tabs {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            client,
            config,
            overview: ViewSlot::new(),
            touchpoints: ViewSlot::new(),
            details: ViewSlot::new(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let (done_tx, mut done_rx) = mpsc::channel::<View>(8);
        let mut current = View::Overview;
        println!("— {current} —");
        self.open(current, &done_tx);
        println!("{HELP}");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                Some(view) = done_rx.recv() => {
                    if view == current {
                        self.print(view);
                        println!("{HELP}");
                    }
                }
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match line.trim() {
                        "" => {}
                        "1" => self.switch(&mut current, View::Overview, &done_tx),
                        "2" => self.switch(&mut current, View::Touchpoints, &done_tx),
                        "3" => self.switch(&mut current, View::Details, &done_tx),
                        "r" => match refresh::trigger(&self.client, &self.config.refresh_url).await {
                            Ok(()) => println!("Rigenerazione del foglio avviata."),
                            Err(err) => {
                                error!(error = %err, "refresh failed");
                                println!("Rigenerazione non riuscita.");
                            }
                        },
                        "q" => break,
                        other => println!("Comando sconosciuto: {other}"),
                    }
                }
            }
        }
        Ok(())
    }

    fn switch(&mut self, current: &mut View, next: View, done: &mpsc::Sender<View>) {
        if *current == next {
            return;
        }
        self.close(*current);
        *current = next;
        println!("— {next} —");
        self.open(next, done);
    }

    fn open(&mut self, view: View, done: &mpsc::Sender<View>) {
        println!("{LOADING}");
        let client = self.client.clone();
        match view {
            View::Overview => {
                let url = self.config.data_url.clone();
                self.overview.open(
                    view,
                    async move {
                        let rows =
                            sheets::fetch_sheet(&client, &url, Envelope::Storage, SHEET_OVERVIEW)
                                .await?;
                        Ok(parse_overview(&rows))
                    },
                    done.clone(),
                );
            }
            View::Touchpoints => {
                let url = self.config.data_url.clone();
                self.touchpoints.open(
                    view,
                    async move {
                        let rows = sheets::fetch_sheet(
                            &client,
                            &url,
                            Envelope::Storage,
                            SHEET_TOUCHPOINTS,
                        )
                        .await?;
                        Ok(parse_touchpoints(&rows))
                    },
                    done.clone(),
                );
            }
            View::Details => {
                let url = self.config.detail_url.clone();
                self.details.open(
                    view,
                    async move {
                        let rows =
                            sheets::fetch_sheet(&client, &url, Envelope::Direct, SHEET_DETAILS)
                                .await?;
                        Ok(parse_detail(&rows))
                    },
                    done.clone(),
                );
            }
        }
    }

    fn close(&mut self, view: View) {
        match view {
            View::Overview => self.overview.close(),
            View::Touchpoints => self.touchpoints.close(),
            View::Details => self.details.close(),
        }
    }

    fn print(&self, view: View) {
        let rendered = match view {
            View::Overview => render_state(&self.overview, render::render_overview),
            View::Touchpoints => render_state(&self.touchpoints, |rows| {
                render::render_touchpoints(rows)
            }),
            View::Details => render_state(&self.details, render::render_detail),
        };
        print!("{rendered}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[tokio::test]
    async fn a_successful_load_commits_and_notifies_once() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut slot: ViewSlot<i32> = ViewSlot::new();
        slot.open(View::Overview, async { Ok(42) }, tx);

        assert_eq!(rx.recv().await, Some(View::Overview));
        slot.read(|s| assert_eq!(s, &LoadState::Ready(42)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn a_failed_load_surfaces_the_single_error_message() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut slot: ViewSlot<i32> = ViewSlot::new();
        slot.open(View::Touchpoints, async { Err(anyhow!("HTTP 500")) }, tx);

        assert_eq!(rx.recv().await, Some(View::Touchpoints));
        slot.read(|s| assert_eq!(s, &LoadState::Failed(DATA_UNAVAILABLE.to_string())));
        // no automatic retry: nothing else arrives
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reopening_discards_the_previous_fetch() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut slot: ViewSlot<i32> = ViewSlot::new();
        slot.open(
            View::Overview,
            std::future::pending::<Result<i32>>(),
            tx.clone(),
        );
        slot.open(View::Overview, async { Ok(2) }, tx);

        assert_eq!(rx.recv().await, Some(View::Overview));
        slot.read(|s| assert_eq!(s, &LoadState::Ready(2)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closing_a_view_suppresses_its_late_result() {
        let (done_tx, mut done_rx) = mpsc::channel(4);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let mut slot: ViewSlot<i32> = ViewSlot::new();
        slot.open(
            View::Details,
            async move {
                let _ = release_rx.await;
                Ok(7)
            },
            done_tx,
        );
        slot.close();
        let _ = release_tx.send(());
        tokio::task::yield_now().await;

        slot.read(|s| assert_eq!(s, &LoadState::Idle));
        assert!(done_rx.try_recv().is_err());
    }
}
