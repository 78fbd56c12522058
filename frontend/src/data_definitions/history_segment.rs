//! Search page history entries carried in a route segment.

use std::{fmt::Display, str::FromStr};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use common::history_state::HistoryState;

/// A [`HistoryState`] stored as unpadded url safe base64 of its CBOR
/// encoding. The engine state is left out when the facets filter alone
/// reproduces it, so entries without nested values stay short.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistorySegment(HistoryState);

impl HistorySegment {
    pub fn state(&self) -> &HistoryState {
        &self.0
    }

    pub fn user_query(&self) -> &str {
        &self.0.user_query
    }

    fn compacted(&self) -> HistoryState {
        let mut state = self.0.clone();
        if state.engine_state.as_ref() == Some(&state.facets_filter.to_engine_state()) {
            state.engine_state = None;
        }
        state
    }
}

impl From<HistoryState> for HistorySegment {
    fn from(state: HistoryState) -> Self {
        HistorySegment(state)
    }
}

impl Display for HistorySegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut serialized = Vec::new();
        if ciborium::into_writer(&self.compacted(), &mut serialized).is_ok() {
            write!(f, "{}", URL_SAFE_NO_PAD.encode(serialized))?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum SegmentError {
    Empty,
    Decode(base64::DecodeError),
    Deserialize(ciborium::de::Error<std::io::Error>),
}

impl std::fmt::Display for SegmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty search history entry"),
            Self::Decode(err) => write!(f, "search history entry is not base64: {}", err),
            Self::Deserialize(err) => write!(f, "search history entry is unreadable: {}", err),
        }
    }
}

impl FromStr for HistorySegment {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // links copied from older entries may still carry padding
        let s = s.trim_end_matches('=');
        if s.is_empty() {
            return Err(SegmentError::Empty);
        }
        let decoded = URL_SAFE_NO_PAD.decode(s.as_bytes()).map_err(SegmentError::Decode)?;
        let state = ciborium::from_reader(std::io::Cursor::new(decoded)).map_err(SegmentError::Deserialize)?;
        Ok(HistorySegment(state))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use common::facets_filter::FacetsFilter;
    use common::history_state::FilterState;
    use pretty_assertions::assert_eq;

    fn flat_state() -> HistoryState {
        let mut facets_filter = FacetsFilter::new();
        facets_filter.include_facet_value("collection", "Articles & Preprints");
        facets_filter.exclude_facet_value("year", "2000");
        let engine_state = Some(facets_filter.to_engine_state());
        HistoryState { path: "/search".into(), facets_filter, user_query: "ellis".into(), engine_state }
    }

    #[test]
    fn test_flat_entry_drops_derivable_engine_state() {
        let state = flat_state();
        let segment = HistorySegment::from(state.clone()).to_string();
        assert!(!segment.contains('/'));
        assert!(!segment.ends_with('='));

        let parsed: HistorySegment = segment.parse().unwrap();
        assert_eq!(parsed.state().engine_state, None);
        assert_eq!(parsed.state().facets_filter, state.facets_filter);
        assert_eq!(parsed.state().engine_state(), state.engine_state());
        assert_eq!(parsed.user_query(), "ellis");
    }

    #[test]
    fn test_nested_entry_keeps_paths() {
        let mut facets_filter = FacetsFilter::new();
        facets_filter.include_facet_value("collection", "Theses");
        let nested = FilterState::new(vec!["Theses".into()], vec![]).with_path("Theses", vec!["Books".into()]);
        let engine_state = BTreeMap::from([(
            "collection".to_string(),
            BTreeMap::from([("collection".to_string(), nested)]),
        )]);
        let state = HistoryState {
            path: "/search".into(),
            facets_filter,
            user_query: String::new(),
            engine_state: Some(engine_state),
        };
        let parsed: HistorySegment = HistorySegment::from(state.clone()).to_string().parse().unwrap();
        assert_eq!(parsed.state(), &state);
    }

    #[test]
    fn test_padded_segment_is_accepted() {
        let segment = HistorySegment::from(flat_state()).to_string();
        let padded = format!("{segment}==");
        assert!(padded.parse::<HistorySegment>().is_ok());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!("not base64!".parse::<HistorySegment>(), Err(SegmentError::Decode(_))));
        assert!(matches!("".parse::<HistorySegment>(), Err(SegmentError::Empty)));
        assert!(matches!("AAAA".parse::<HistorySegment>(), Err(SegmentError::Deserialize(_))));
    }
}
