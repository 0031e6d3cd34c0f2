use std::sync::Once;

use grounding_core::{
    update, AppState, BoundingBox, ChatAnswer, ChatSource, Chunk, Effect, Grounding, LoadTicket,
    Msg, NavigationOutcome, SearchHit,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Chunks as decoded from a backend that issues no chunk ids: keys are positions.
fn positional_chunks(count: usize) -> Vec<Chunk> {
    (0..count)
        .map(|i| Chunk {
            key: i.to_string(),
            text: format!("paragraph {i}"),
            chunk_type: "text".to_string(),
            grounding: Some(Grounding {
                page: (i / 4) as u32,
                bbox: Some(BoundingBox::new(0.1, 0.1, 0.9, 0.2)),
            }),
        })
        .collect()
}

fn hit(doc_id: &str, chunk_key: &str) -> SearchHit {
    SearchHit {
        doc_id: doc_id.to_string(),
        chunk_key: chunk_key.to_string(),
        page: 1,
        chunk_type: "text".to_string(),
        text: "matching text".to_string(),
        score: 0.87,
        grounding: None,
    }
}

fn load_ticket(effects: &[Effect], doc: &str) -> LoadTicket {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::LoadChunks { doc_id, ticket } if doc_id == doc => Some(*ticket),
            _ => None,
        })
        .expect("load chunks effect")
}

fn with_doc_a_selected() -> AppState {
    let (state, effects) = update(
        AppState::new(),
        Msg::DocumentSelected {
            doc_id: "doc-a".to_string(),
        },
    );
    let ticket = load_ticket(&effects, "doc-a");
    let (state, _) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-a".to_string(),
            ticket,
            result: Ok(positional_chunks(3)),
        },
    );
    let (state, _) = update(state, Msg::ChunkClicked(2));
    assert_eq!(state.view().selected_chunk, Some(2));
    state
}

#[test]
fn search_hit_in_other_document_selects_target_chunk() {
    init_logging();
    let state = with_doc_a_selected();
    let (state, effects) = update(state, Msg::SearchSubmitted("revenue".to_string()));
    assert_eq!(
        effects,
        vec![Effect::Search {
            query: "revenue".to_string(),
            n_results: 10
        }]
    );
    let (state, _) = update(state, Msg::SearchCompleted(Ok(vec![hit("doc-b", "7")])));
    assert!(state.view().search.visible);

    let (state, effects) = update(state, Msg::SearchResultActivated(0));
    let view = state.view();
    assert!(!view.search.visible);
    assert_eq!(view.selected_chunk, None);
    assert_eq!(view.active.expect("active").doc_id, "doc-b");

    let ticket = load_ticket(&effects, "doc-b");
    let (state, effects) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-b".to_string(),
            ticket,
            result: Ok(positional_chunks(10)),
        },
    );

    assert_eq!(effects[0], Effect::ScrollListToChunk { index: 7 });
    let view = state.view();
    assert_eq!(view.selected_chunk, Some(7));
    assert_eq!(view.chunks.iter().filter(|c| c.selected).count(), 1);
    assert_eq!(
        view.navigation,
        Some(NavigationOutcome::Selected {
            doc_id: "doc-b".to_string(),
            index: 7
        })
    );
}

#[test]
fn unresolved_key_ends_with_no_selection_and_a_notice() {
    init_logging();
    let state = with_doc_a_selected();
    let (state, _) = update(state, Msg::SearchCompleted(Ok(vec![hit("doc-b", "42")])));
    let (state, effects) = update(state, Msg::SearchResultActivated(0));
    let ticket = load_ticket(&effects, "doc-b");
    let (state, effects) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-b".to_string(),
            ticket,
            result: Ok(positional_chunks(5)),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.selected_chunk, None);
    assert_eq!(view.chunks.len(), 5);
    assert_eq!(
        view.navigation,
        Some(NavigationOutcome::SourceUnavailable {
            doc_id: "doc-b".to_string(),
            chunk_key: "42".to_string()
        })
    );
}

#[test]
fn newer_navigation_supersedes_older_one() {
    init_logging();
    let state = with_doc_a_selected();
    let (state, _) = update(
        state,
        Msg::SearchCompleted(Ok(vec![hit("doc-b", "1"), hit("doc-c", "2")])),
    );
    let (state, first) = update(state, Msg::SearchResultActivated(0));
    let (state, _) = update(state, Msg::SearchCompleted(Ok(vec![hit("doc-c", "2")])));
    let (state, second) = update(state, Msg::SearchResultActivated(0));

    let (state, effects) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-b".to_string(),
            ticket: load_ticket(&first, "doc-b"),
            result: Ok(positional_chunks(4)),
        },
    );
    assert!(effects.is_empty());
    assert!(state.view().chunks.is_empty());

    let (state, _) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-c".to_string(),
            ticket: load_ticket(&second, "doc-c"),
            result: Ok(positional_chunks(4)),
        },
    );
    let view = state.view();
    assert_eq!(view.active.expect("active").doc_id, "doc-c");
    assert_eq!(view.selected_chunk, Some(2));
}

#[test]
fn failed_target_load_records_outcome() {
    init_logging();
    let state = with_doc_a_selected();
    let (state, _) = update(state, Msg::SearchCompleted(Ok(vec![hit("doc-b", "1")])));
    let (state, effects) = update(state, Msg::SearchResultActivated(0));
    let (state, _) = update(
        state,
        Msg::ChunksLoaded {
            doc_id: "doc-b".to_string(),
            ticket: load_ticket(&effects, "doc-b"),
            result: Err("503".to_string()),
        },
    );
    let view = state.view();
    assert_eq!(view.selected_chunk, None);
    assert!(view.banner.is_some());
    assert_eq!(
        view.navigation,
        Some(NavigationOutcome::LoadFailed {
            doc_id: "doc-b".to_string()
        })
    );
}

#[test]
fn chat_citation_uses_known_filename() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::DocumentsLoaded(Ok(vec![grounding_core::Document {
            doc_id: "0123456789abcdef".to_string(),
            filename: "report.pdf".to_string(),
        }])),
    );
    let (state, _) = update(state, Msg::ChatSubmitted("Where is revenue?".to_string()));
    let (state, _) = update(
        state,
        Msg::ChatAnswered(Ok(ChatAnswer {
            answer: "On page 2.".to_string(),
            sources: vec![
                ChatSource {
                    doc_id: "0123456789abcdef".to_string(),
                    chunk_key: "3".to_string(),
                    filename: None,
                    page: 1,
                    chunk_type: "text".to_string(),
                },
                ChatSource {
                    doc_id: "fedcba9876543210".to_string(),
                    chunk_key: "0".to_string(),
                    filename: None,
                    page: 0,
                    chunk_type: "table".to_string(),
                },
            ],
        })),
    );

    let (named, effects) = update(
        state.clone(),
        Msg::ChatSourceActivated {
            message: 2,
            source: 0,
        },
    );
    assert!(!effects.is_empty());
    assert_eq!(named.view().active.expect("active").display_name, "report.pdf");

    let (unnamed, _) = update(
        state,
        Msg::ChatSourceActivated {
            message: 2,
            source: 1,
        },
    );
    assert_eq!(
        unnamed.view().active.expect("active").display_name,
        "Document fedcba98"
    );
}
