//! Paginated listing with continuation tokens and bounded retry.

use crate::cluster::{ClusterApi, DynamicObject, GroupVersionKind, ListParams};
use crate::error::{ReconcileError, Result};
use crate::reconciler::backoff::BackoffPolicy;
use crate::shutdown::Shutdown;

/// Walks every page of a list call.
///
/// Each page is requested with the previous page's continuation token until the
/// server returns an empty one. Items are handed out as their page arrives.
pub struct Paginator<'a, C: ?Sized> {
    client: &'a C,
    page_size: u32,
    backoff: BackoffPolicy,
    shutdown: &'a Shutdown,
}

impl<'a, C> Paginator<'a, C>
where
    C: ClusterApi + ?Sized,
{
    pub fn new(
        client: &'a C,
        page_size: u32,
        backoff: BackoffPolicy,
        shutdown: &'a Shutdown,
    ) -> Self {
        Self {
            client,
            page_size,
            backoff,
            shutdown,
        }
    }

    /// Lists every object of `gvk`, calling `on_item` for each one in order.
    ///
    /// Items without `apiVersion`/`kind` inherit `gvk`. An error from `on_item`
    /// stops the walk.
    pub async fn for_each<F>(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        mut on_item: F,
    ) -> Result<()>
    where
        F: FnMut(DynamicObject) -> Result<()>,
    {
        let mut params = ListParams {
            namespace: namespace.map(str::to_string),
            limit: self.page_size,
            continue_token: None,
        };
        let mut pages = 0usize;

        loop {
            let page = self
                .shutdown
                .guard(self.client.list(gvk, &params))
                .await?
                .map_err(|source| ReconcileError::List {
                    gvk: gvk.clone(),
                    source,
                })?;
            pages += 1;

            for mut item in page.items {
                item.ensure_gvk(gvk);
                on_item(item)?;
            }

            if page.continue_token.is_empty() {
                break;
            }
            params.continue_token = Some(page.continue_token);
        }

        log::trace!("Listed {} in {} page(s)", gvk, pages);
        Ok(())
    }

    /// Like [`for_each`](Self::for_each), restarting from the first page after a
    /// retryable list failure until the backoff policy is exhausted.
    ///
    /// Items seen before a failure are handed out again on the next attempt.
    pub async fn for_each_with_retry<F>(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        mut on_item: F,
    ) -> Result<()>
    where
        F: FnMut(DynamicObject) -> Result<()>,
    {
        let mut delays = self.backoff.delays();
        loop {
            match self.for_each(gvk, namespace, &mut on_item).await {
                Err(e) if e.is_retryable() => match delays.next() {
                    Some(delay) => {
                        log::warn!("{}; retrying in {:?}", e, delay);
                        if !self.shutdown.sleep(delay).await {
                            return Err(ReconcileError::Cancelled);
                        }
                    }
                    None => return Err(e),
                },
                result => return result,
            }
        }
    }

    /// Collects every object of `gvk`, retrying like
    /// [`for_each_with_retry`](Self::for_each_with_retry) without duplicating items.
    pub async fn collect_with_retry(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        let mut delays = self.backoff.delays();
        loop {
            let mut items = Vec::new();
            let result = self
                .for_each(gvk, namespace, |item| {
                    items.push(item);
                    Ok(())
                })
                .await;
            match result {
                Ok(()) => return Ok(items),
                Err(e) if e.is_retryable() => match delays.next() {
                    Some(delay) => {
                        log::warn!("{}; retrying in {:?}", e, delay);
                        if !self.shutdown.sleep(delay).await {
                            return Err(ReconcileError::Cancelled);
                        }
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }
}
