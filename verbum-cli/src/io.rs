//! Backend I/O for the native CLI
//!
//! Effects from the [`App`] are performed on the tokio runtime. Results come
//! back over a channel and are applied on the UI thread between frames, so
//! the session is only ever touched from one place.

use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use verbum_core::{
    fetch_reading, Annotation, App, Book, ContentClient, Effect, Focus, QuickSearchResult,
    ReadingLoad, Result,
};

/// A finished backend call
#[derive(Debug)]
pub enum Outcome {
    Books(Result<Vec<Book>>),
    Loaded(ReadingLoad),
    Searched(u64, Result<QuickSearchResult>),
    Created(Result<Annotation>),
    Updated(Result<Annotation>),
    Deleted(Annotation, Result<()>),
}

/// Runs effects against a content client
pub struct Worker<C> {
    client: Arc<C>,
    tx: UnboundedSender<Outcome>,
}

impl<C> Worker<C>
where
    C: ContentClient + Send + Sync + 'static,
{
    pub fn new(client: C) -> (Self, UnboundedReceiver<Outcome>) {
        let (tx, rx) = unbounded_channel();
        let worker = Self {
            client: Arc::new(client),
            tx,
        };
        (worker, rx)
    }

    pub fn fetch_books(&self) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let books = client.books().await;
            let _ = tx.send(Outcome::Books(books));
        });
    }

    pub fn perform(&self, effect: Effect) {
        debug!(?effect, "performing effect");
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = match effect {
                Effect::Load(ticket) => Outcome::Loaded(fetch_reading(&*client, ticket).await),
                Effect::Search(ticket) => {
                    let result = client.quick_search(&ticket.query).await;
                    Outcome::Searched(ticket.seq, result)
                }
                Effect::Create(new) => Outcome::Created(client.create_annotation(&new).await),
                Effect::Update(id, patch) => {
                    Outcome::Updated(client.update_annotation(id, &patch).await)
                }
                Effect::Delete(removed) => {
                    let result = client.delete_annotation(removed.id).await;
                    Outcome::Deleted(removed, result)
                }
            };
            // Receiver gone means the UI is shutting down
            let _ = tx.send(outcome);
        });
    }
}

/// Fold a finished call into the app state
pub fn apply(app: &mut App, outcome: Outcome) {
    match outcome {
        Outcome::Books(books) => app.session.apply_books(books),
        Outcome::Loaded(load) => {
            if app.session.apply_load(load) {
                app.sync_focus();
            }
        }
        Outcome::Searched(seq, result) => {
            app.session.apply_search(seq, result);
        }
        Outcome::Created(created) => {
            app.session.annotation_created(created);
        }
        Outcome::Updated(updated) => app.session.annotation_updated(updated),
        Outcome::Deleted(removed, result) => {
            app.session.annotation_deleted(removed, result);
            if app.focus == Focus::Annotations {
                app.sync_focus();
            }
        }
    }
}
