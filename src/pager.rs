//! Sequential page iteration over a collection resource.
//!
//! The API has no page-count metadata: the caller requests `pgNum=1,2,3…` and
//! a page whose decoded item list is empty signals exhaustion. Page numbers
//! are only meaningful in the order requested, so the pager hands out each
//! page exactly once and fuses after the empty page.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::client::{ApiClient, ClientError};

/// Query parameter carrying the 1-based page number.
const PAGE_PARAM: &str = "pgNum";

/// A decoded page envelope that can surrender its item list.
///
/// This is the seam between the generic paging loop and a concrete resource:
/// implement it for the envelope type a resource wraps its rows in.
pub trait PageBody: DeserializeOwned {
    type Item;

    fn into_items(self) -> Vec<Self::Item>;
}

/// Lazily pages through one resource with a fixed path and query.
pub struct Pager<'a, E: PageBody> {
    client: &'a ApiClient,
    path: &'a str,
    query: Vec<(&'static str, String)>,
    next_page: u32,
    done: bool,
    _envelope: PhantomData<E>,
}

impl<'a, E: PageBody> Pager<'a, E> {
    pub fn new(client: &'a ApiClient, path: &'a str, query: Vec<(&'static str, String)>) -> Self {
        Self {
            client,
            path,
            query,
            next_page: 1,
            done: false,
            _envelope: PhantomData,
        }
    }

    /// Fetch the next page of items.
    ///
    /// `Ok(None)` signals exhaustion, not an error; subsequent calls keep
    /// returning `Ok(None)` without touching the network. A transport or
    /// decode failure is returned as-is and is fatal to the caller's run.
    pub async fn next(&mut self) -> Result<Option<Vec<E::Item>>, ClientError> {
        if self.done {
            return Ok(None);
        }

        let mut query = self.query.clone();
        query.push((PAGE_PARAM, self.next_page.to_string()));

        let envelope: E = self.client.get_json(self.path, &query).await?;
        let items = envelope.into_items();
        if items.is_empty() {
            self.done = true;
            return Ok(None);
        }

        self.next_page += 1;
        Ok(Some(items))
    }
}
