//! Counts each viewing session of a video at most once.
//!
//! A play event for an idle video issues one increment to the catalog
//! service; further plays are ignored until the matching end event. The
//! local view count is bumped only after the server acknowledges the
//! increment, and a failed increment still counts as "counted" for the rest
//! of the session so repeated play/pause does not hammer the service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::api::{ApiRequest, Endpoints, RequestBody, Transport};
use crate::models::VideoId;
use crate::services::catalog::CatalogCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The server acknowledged the increment and the cache was bumped.
    Counted,
    /// An increment was issued but failed; the session stays counted.
    CountFailed,
    /// This session was already counted.
    AlreadyCounted,
    /// The previous session's increment is still outstanding; this session
    /// is counted by the same task once that call returns.
    Queued,
}

#[derive(Debug, Default)]
struct Session {
    playing: bool,
    in_flight: bool,
    queued: bool,
}

pub struct ViewTracker<T> {
    transport: Arc<T>,
    endpoints: Arc<Endpoints>,
    cache: Arc<CatalogCache>,
    sessions: Mutex<HashMap<VideoId, Session>>,
}

impl<T: Transport> ViewTracker<T> {
    pub fn new(transport: Arc<T>, endpoints: Arc<Endpoints>, cache: Arc<CatalogCache>) -> Self {
        Self {
            transport,
            endpoints,
            cache,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// True once an increment has been issued for the current session of `id`.
    /// A queued session is not counted until its increment goes out.
    pub fn is_counted(&self, id: &VideoId) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .is_some_and(|s| s.playing && !s.queued)
    }

    /// True while the current session of `id` waits for the previous
    /// session's increment to return.
    pub fn is_queued(&self, id: &VideoId) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .is_some_and(|s| s.queued)
    }

    pub async fn on_play(&self, id: &VideoId) -> PlayOutcome {
        {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            let session = sessions.entry(id.clone()).or_default();
            if session.playing {
                return PlayOutcome::AlreadyCounted;
            }
            session.playing = true;
            if session.in_flight {
                session.queued = true;
                return PlayOutcome::Queued;
            }
            session.in_flight = true;
        }
        let _pending = PendingIncrement {
            sessions: &self.sessions,
            id,
        };

        loop {
            let counted = self.increment(id).await;

            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(session) = sessions.get_mut(id) {
                if session.queued {
                    session.queued = false;
                    continue;
                }
            }
            drop(sessions);
            return outcome(counted);
        }
    }

    /// Ends the session; the next play is eligible for a new increment.
    pub fn on_end(&self, id: &VideoId) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get_mut(id) {
            session.playing = false;
            if !session.in_flight {
                sessions.remove(id);
            }
        }
    }

    async fn increment(&self, id: &VideoId) -> bool {
        let request = ApiRequest::post(self.endpoints.view(id), RequestBody::Empty);
        match self.transport.send(request).await {
            Ok(response) if response.is_success() => {
                self.cache.update(|videos| {
                    videos.iter().any(|v| &v.id == id).then(|| {
                        videos
                            .iter()
                            .cloned()
                            .map(|mut v| {
                                if &v.id == id {
                                    v.views = v.views.saturating_add(1);
                                }
                                v
                            })
                            .collect()
                    })
                });
                true
            }
            Ok(response) => {
                log::warn!(
                    "View increment for {} rejected with status {}",
                    id,
                    response.status
                );
                false
            }
            Err(e) => {
                log::warn!("View increment for {} failed: {}", id, e);
                false
            }
        }
    }
}

/// Owns the `in_flight` flag of one video while its increment task runs,
/// whether the task completes or is dropped mid-request.
struct PendingIncrement<'a> {
    sessions: &'a Mutex<HashMap<VideoId, Session>>,
    id: &'a VideoId,
}

impl Drop for PendingIncrement<'_> {
    fn drop(&mut self) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get_mut(self.id) {
            session.in_flight = false;
            if session.queued {
                // its increment was never issued
                session.queued = false;
                session.playing = false;
            }
            if !session.playing {
                sessions.remove(self.id);
            }
        }
    }
}

fn outcome(counted: bool) -> PlayOutcome {
    if counted {
        PlayOutcome::Counted
    } else {
        PlayOutcome::CountFailed
    }
}
