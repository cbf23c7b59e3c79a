//! Command dispatcher.
//!
//! Consumes channel events one at a time: a command is fully handled,
//! revalidation and re-run included, before the next frame is read. Bursts
//! of `revalidate` therefore queue up instead of overlapping.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use url::Url;

use super::ChangeHandler;
use crate::channel::{ChannelEvent, ChannelLossPolicy, Command, Connector};
use crate::revalidate::Revalidator;
use crate::runner::{ModuleRunner, RunOptions};

pub(super) struct Dispatcher {
    pub runner: Arc<ModuleRunner>,
    pub revalidator: Revalidator,
    pub connector: Arc<dyn Connector>,
    pub endpoint: String,
    pub policy: ChannelLossPolicy,
    pub url: Url,
    pub options: RunOptions,
    pub handler: ChangeHandler,
    pub shutdown: watch::Receiver<bool>,
}

impl Dispatcher {
    /// Run until shutdown, or until the channel is lost and the policy gives up.
    pub async fn run(mut self, mut events: mpsc::Receiver<ChannelEvent>) {
        loop {
            if *self.shutdown.borrow() {
                return;
            }

            let event = tokio::select! {
                _ = self.shutdown.changed() => return,
                event = events.recv() => event,
            };

            match event {
                Some(ChannelEvent::Message(text)) => self.handle_frame(&text).await,
                Some(ChannelEvent::Closed(reason)) => {
                    crate::log!("channel"; "connection lost: {}", reason);
                    match self.reconnect().await {
                        Some(next) => events = next,
                        None => return,
                    }
                }
                None => {
                    crate::log!("channel"; "connection lost");
                    match self.reconnect().await {
                        Some(next) => events = next,
                        None => return,
                    }
                }
            }
        }
    }

    async fn handle_frame(&self, text: &str) {
        let command = match Command::decode(text) {
            Ok(command) => command,
            Err(e) => {
                crate::debug!("channel"; "ignoring malformed frame: {}", e);
                return;
            }
        };

        match command {
            Command::Revalidate { paths } => {
                self.revalidator.request_revalidate(&paths).await;
                crate::log!("revalidate"; "revalidated {:?}", paths);
                self.on_change().await;
            }
            Command::Files { files } => {
                // Advisory only; a "revalidate everything" reaction would hook in here
                crate::log!("channel"; "current-files {:?}", files);
            }
            Command::Unknown => crate::debug!("channel"; "ignoring unknown command"),
        }
    }

    async fn on_change(&self) {
        match &self.handler {
            ChangeHandler::Rerun => {
                if let Err(e) = self.runner.run(&self.url, self.options).await {
                    crate::log!("error"; "{:#}", anyhow::Error::from(e));
                }
            }
            ChangeHandler::Custom(callback) => callback(),
        }
    }

    /// Apply the loss policy. `None` ends dispatching.
    async fn reconnect(&mut self) -> Option<mpsc::Receiver<ChannelEvent>> {
        let ChannelLossPolicy::Reconnect { delay } = self.policy else {
            crate::debug!("channel"; "not reconnecting");
            return None;
        };

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
            match self.connector.connect(&self.endpoint).await {
                Ok(events) => {
                    crate::log!("channel"; "reconnected");
                    return Some(events);
                }
                Err(e) => crate::debug!("channel"; "{}", e),
            }
        }
    }
}
