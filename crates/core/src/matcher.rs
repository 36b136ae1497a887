// Responder matching strategies
//
// FirstNMatcher is the default policy: the first N responders in storage order.
// ServiceTagMatcher narrows to responders offering a service before bounding.

use crate::event::Event;
use crate::responder::Responder;
use crate::traits::ResponderMatcher;

/// Default upper bound on responders notified per event
pub const DEFAULT_MAX_RESPONDERS: usize = 10;

/// Select the first `limit` candidates, preserving their order
#[derive(Debug, Clone)]
pub struct FirstNMatcher {
    limit: usize,
}

impl FirstNMatcher {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Default for FirstNMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESPONDERS)
    }
}

impl ResponderMatcher for FirstNMatcher {
    fn name(&self) -> &str {
        "first_n"
    }

    fn score_and_select(&self, _event: &Event, candidates: &[Responder]) -> Vec<Responder> {
        candidates.iter().take(self.limit).cloned().collect()
    }
}

/// Prefer responders offering `service`; fall back to everyone when nobody does
#[derive(Debug, Clone)]
pub struct ServiceTagMatcher {
    service: String,
    limit: usize,
}

impl ServiceTagMatcher {
    pub fn new(service: impl Into<String>, limit: usize) -> Self {
        Self {
            service: service.into(),
            limit,
        }
    }
}

impl ResponderMatcher for ServiceTagMatcher {
    fn name(&self) -> &str {
        "service_tag"
    }

    fn score_and_select(&self, _event: &Event, candidates: &[Responder]) -> Vec<Responder> {
        let tagged: Vec<&Responder> = candidates
            .iter()
            .filter(|r| r.offers(&self.service))
            .collect();

        if tagged.is_empty() {
            return candidates.iter().take(self.limit).cloned().collect();
        }

        tagged.into_iter().take(self.limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn event() -> Event {
        Event {
            id: Uuid::now_v7(),
            device_id: "D1".to_string(),
            event_type: "possible_encampment".to_string(),
            raw_payload: "{}".to_string(),
            created_at: Utc::now(),
            matched_responders: vec![],
            status: EventStatus::New,
        }
    }

    fn responders(n: usize) -> Vec<Responder> {
        (0..n)
            .map(|i| Responder {
                id: Uuid::now_v7(),
                name: format!("Responder {}", i),
                phone: Some(format!("+1555000{:04}", i)),
                email: None,
                location: None,
                services: if i % 2 == 0 {
                    vec!["shelter".to_string()]
                } else {
                    vec!["medical".to_string()]
                },
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_first_n_bounds_to_limit() {
        let candidates = responders(15);
        let selected = FirstNMatcher::default().score_and_select(&event(), &candidates);
        assert_eq!(selected.len(), 10);
        assert_eq!(selected[..], candidates[..10]);
    }

    #[test]
    fn test_first_n_returns_all_when_fewer_than_limit() {
        let candidates = responders(3);
        let selected = FirstNMatcher::default().score_and_select(&event(), &candidates);
        assert_eq!(selected, candidates);
    }

    #[test]
    fn test_first_n_empty_candidates() {
        let selected = FirstNMatcher::default().score_and_select(&event(), &[]);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_first_n_is_deterministic() {
        let candidates = responders(12);
        let matcher = FirstNMatcher::default();
        let ev = event();
        let first: Vec<Uuid> = matcher
            .score_and_select(&ev, &candidates)
            .into_iter()
            .map(|r| r.id)
            .collect();
        let second: Vec<Uuid> = matcher
            .score_and_select(&ev, &candidates)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_service_tag_prefers_tagged() {
        let candidates = responders(6);
        let selected = ServiceTagMatcher::new("medical", 2).score_and_select(&event(), &candidates);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].id, candidates[1].id);
        assert_eq!(selected[1].id, candidates[3].id);
    }

    #[test]
    fn test_service_tag_falls_back_to_all() {
        let candidates = responders(4);
        let selected = ServiceTagMatcher::new("food", 3).score_and_select(&event(), &candidates);
        assert_eq!(selected, candidates[..3].to_vec());
    }
}
