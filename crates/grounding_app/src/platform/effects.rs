use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use grounding_core::{
    BoundingBox, ChatAnswer, ChatSource, ChatTurn, Chunk, Document, Effect, Grounding,
    Msg, SearchHit, TaskStatus, TaskUpdate,
};
use grounding_engine::{
    ApiError, ChatAnswerRecord, ChatTurnRecord, ChunkRecord, DocumentRecord, EngineCommand,
    EngineEvent, EngineHandle, GroundingRecord, SearchHitRecord, UploadProgress, UploadStage,
};

/// Sends IO effects to the engine and turns its events back into messages.
///
/// Keeps count of the engine events still owed so a caller can tell when
/// every request it made has been answered.
pub struct EffectRunner {
    engine: EngineHandle,
    outstanding: usize,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            outstanding: 0,
        }
    }

    /// Number of engine completions not received yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Queue `effect` on the engine. Hands the effect back when it is not
    /// engine work, so the caller can run it locally.
    pub fn submit(&mut self, effect: Effect) -> Option<Effect> {
        let Some((command, completions)) = to_command(&effect) else {
            return Some(effect);
        };
        engine_debug!("engine command {:?}", command);
        if self.engine.send(command) {
            self.outstanding += completions;
        } else {
            engine_warn!("engine is gone; dropped {:?}", effect);
        }
        None
    }

    /// Wait up to `timeout` for the next engine event.
    pub fn recv(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        let (msg, completes) = translate(event);
        if completes {
            self.outstanding = self.outstanding.saturating_sub(1);
        }
        Some(msg)
    }
}

/// Engine command for an IO effect, plus how many completion events it owes.
pub fn to_command(effect: &Effect) -> Option<(EngineCommand, usize)> {
    let command = match effect {
        Effect::LoadDocuments => (EngineCommand::ListDocuments, 1),
        Effect::LoadChunks { doc_id, ticket } => (
            EngineCommand::LoadChunks {
                doc_id: doc_id.clone(),
                ticket: *ticket,
            },
            1,
        ),
        Effect::FetchDocument { doc_id } => (
            EngineCommand::FetchDocument {
                doc_id: doc_id.clone(),
            },
            1,
        ),
        Effect::UploadFile { path } => (EngineCommand::Upload { path: path.clone() }, 1),
        Effect::UploadWave { requests } => {
            engine_info!("starting upload wave of {} file(s)", requests.len());
            (
                EngineCommand::UploadWave {
                    tasks: requests
                        .iter()
                        .map(|request| (request.task_id, request.path.clone()))
                        .collect(),
                },
                requests.len(),
            )
        }
        Effect::Search { query, n_results } => (
            EngineCommand::Search {
                query: query.clone(),
                n_results: *n_results,
            },
            1,
        ),
        Effect::Chat { question, history } => (
            EngineCommand::Chat {
                question: question.clone(),
                history: history.iter().map(turn_record).collect(),
            },
            1,
        ),
        Effect::Extract { doc_id } => (
            EngineCommand::Extract {
                doc_id: doc_id.clone(),
            },
            1,
        ),
        Effect::Validate { doc_id, payload } => (
            EngineCommand::Validate {
                doc_id: doc_id.clone(),
                payload: payload.clone(),
            },
            1,
        ),
        Effect::DeleteDocument { doc_id } => (
            EngineCommand::Delete {
                doc_id: doc_id.clone(),
            },
            1,
        ),
        Effect::RelayoutPages { .. }
        | Effect::ScrollViewport { .. }
        | Effect::ScrollListToChunk { .. }
        | Effect::CapturePointer
        | Effect::ReleasePointer
        | Effect::BatchCompleted(_) => return None,
    };
    Some(command)
}

/// Message for an engine event, and whether the event settles a request.
pub fn translate(event: EngineEvent) -> (Msg, bool) {
    match event {
        EngineEvent::DocumentsListed(result) => (
            Msg::DocumentsLoaded(
                result
                    .map(|records| records.into_iter().map(document).collect())
                    .map_err(describe),
            ),
            true,
        ),
        EngineEvent::ChunksLoaded {
            doc_id,
            ticket,
            result,
        } => (
            Msg::ChunksLoaded {
                doc_id,
                ticket,
                result: result
                    .map(|records| records.into_iter().map(chunk).collect())
                    .map_err(describe),
            },
            true,
        ),
        EngineEvent::DocumentCached { doc_id, result } => (
            Msg::DocumentCached {
                doc_id,
                result: result.map_err(describe),
            },
            true,
        ),
        EngineEvent::Uploaded(result) => (
            Msg::UploadCompleted(result.map(document).map_err(describe)),
            true,
        ),
        EngineEvent::UploadProgress(progress) => {
            let completes = matches!(progress.stage, UploadStage::Success | UploadStage::Error);
            (task_update(progress), completes)
        }
        EngineEvent::SearchFinished(result) => (
            Msg::SearchCompleted(
                result
                    .map(|records| records.into_iter().map(search_hit).collect())
                    .map_err(describe),
            ),
            true,
        ),
        EngineEvent::ChatFinished(result) => (
            Msg::ChatAnswered(result.map(chat_answer).map_err(describe)),
            true,
        ),
        EngineEvent::Extracted { doc_id, result } => (
            Msg::ExtractCompleted {
                doc_id,
                result: result.map_err(describe),
            },
            true,
        ),
        EngineEvent::Validated { doc_id, result } => (
            Msg::SaveCompleted {
                doc_id,
                result: result.map_err(describe),
            },
            true,
        ),
        EngineEvent::Deleted { doc_id, result } => (
            Msg::DeleteCompleted {
                doc_id,
                result: result.map_err(describe),
            },
            true,
        ),
    }
}

fn describe(err: ApiError) -> String {
    engine_warn!("backend call failed ({}): {}", err.kind, err.message);
    err.message
}

fn map_stage(stage: UploadStage) -> TaskStatus {
    match stage {
        UploadStage::Uploading => TaskStatus::Uploading,
        UploadStage::Parsing => TaskStatus::Parsing,
        UploadStage::Indexing => TaskStatus::Indexing,
        UploadStage::Success => TaskStatus::Success,
        UploadStage::Error => TaskStatus::Error,
    }
}

fn task_update(progress: UploadProgress) -> Msg {
    Msg::BatchTaskUpdated {
        task_id: progress.task_id,
        update: TaskUpdate {
            status: map_stage(progress.stage),
            remote_doc_id: progress.remote_doc_id,
            error: progress.error,
        },
    }
}

fn document(record: DocumentRecord) -> Document {
    Document {
        doc_id: record.doc_id,
        filename: record.filename,
    }
}

fn grounding(record: GroundingRecord) -> Grounding {
    Grounding {
        page: record.page,
        bbox: record
            .bbox
            .map(|b| BoundingBox::new(b.left, b.top, b.right, b.bottom)),
    }
}

fn chunk(record: ChunkRecord) -> Chunk {
    Chunk {
        key: record.key,
        text: record.text,
        chunk_type: record.chunk_type,
        grounding: record.grounding.map(grounding),
    }
}

fn search_hit(record: SearchHitRecord) -> SearchHit {
    SearchHit {
        doc_id: record.doc_id,
        chunk_key: record.chunk_key,
        page: record.page,
        chunk_type: record.chunk_type,
        text: record.text,
        score: record.score,
        grounding: record.grounding.map(grounding),
    }
}

fn chat_answer(record: ChatAnswerRecord) -> ChatAnswer {
    ChatAnswer {
        answer: record.answer,
        sources: record
            .sources
            .into_iter()
            .map(|source| ChatSource {
                doc_id: source.doc_id,
                chunk_key: source.chunk_key,
                filename: source.filename,
                page: source.page,
                chunk_type: source.chunk_type,
            })
            .collect(),
    }
}

fn turn_record(turn: &ChatTurn) -> ChatTurnRecord {
    ChatTurnRecord {
        role: turn.role.as_str().to_string(),
        content: turn.content.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grounding_core::{BatchSummary, ChatRole, UploadRequest};
    use grounding_engine::{BoxRecord, FailureKind};
    use std::path::PathBuf;

    fn api_error(message: &str) -> ApiError {
        ApiError {
            kind: FailureKind::HttpStatus(404),
            message: message.to_string(),
        }
    }

    #[test]
    fn wave_owes_one_completion_per_file() {
        let effect = Effect::UploadWave {
            requests: vec![
                UploadRequest {
                    task_id: 4,
                    path: PathBuf::from("a.pdf"),
                },
                UploadRequest {
                    task_id: 5,
                    path: PathBuf::from("b.pdf"),
                },
            ],
        };
        let (command, owed) = to_command(&effect).unwrap();
        assert_eq!(owed, 2);
        assert_eq!(
            command,
            EngineCommand::UploadWave {
                tasks: vec![(4, PathBuf::from("a.pdf")), (5, PathBuf::from("b.pdf"))]
            }
        );
    }

    #[test]
    fn view_effects_stay_local() {
        assert!(to_command(&Effect::ScrollViewport { top_px: 10.0 }).is_none());
        assert!(to_command(&Effect::RelayoutPages { scale: 1.0 }).is_none());
        assert!(to_command(&Effect::CapturePointer).is_none());
        assert!(to_command(&Effect::BatchCompleted(BatchSummary {
            total: 1,
            success_count: 1
        }))
        .is_none());
    }

    #[test]
    fn chat_history_roles_are_wire_strings() {
        let effect = Effect::Chat {
            question: "What is the total?".into(),
            history: vec![ChatTurn {
                role: ChatRole::Assistant,
                content: "Hi".into(),
            }],
        };
        let (command, _) = to_command(&effect).unwrap();
        assert_eq!(
            command,
            EngineCommand::Chat {
                question: "What is the total?".into(),
                history: vec![ChatTurnRecord {
                    role: "assistant".into(),
                    content: "Hi".into(),
                }],
            }
        );
    }

    #[test]
    fn only_terminal_stages_complete() {
        let progress = |stage| {
            EngineEvent::UploadProgress(UploadProgress {
                task_id: 9,
                stage,
                remote_doc_id: None,
                error: None,
            })
        };
        let (msg, completes) = translate(progress(UploadStage::Parsing));
        assert!(!completes);
        assert_eq!(
            msg,
            Msg::BatchTaskUpdated {
                task_id: 9,
                update: TaskUpdate {
                    status: TaskStatus::Parsing,
                    remote_doc_id: None,
                    error: None,
                },
            }
        );
        assert!(translate(progress(UploadStage::Success)).1);
        assert!(translate(progress(UploadStage::Error)).1);
    }

    #[test]
    fn chunk_records_become_core_chunks() {
        let event = EngineEvent::ChunksLoaded {
            doc_id: "doc-a".into(),
            ticket: 3,
            result: Ok(vec![ChunkRecord {
                key: "c-1".into(),
                text: "Invoice total".into(),
                chunk_type: "text".into(),
                grounding: Some(GroundingRecord {
                    page: 1,
                    bbox: Some(BoxRecord {
                        left: 0.1,
                        top: 0.2,
                        right: 0.5,
                        bottom: 0.3,
                    }),
                }),
            }]),
        };
        let (msg, completes) = translate(event);
        assert!(completes);
        assert_eq!(
            msg,
            Msg::ChunksLoaded {
                doc_id: "doc-a".into(),
                ticket: 3,
                result: Ok(vec![Chunk {
                    key: "c-1".into(),
                    text: "Invoice total".into(),
                    chunk_type: "text".into(),
                    grounding: Some(Grounding {
                        page: 1,
                        bbox: Some(BoundingBox::new(0.1, 0.2, 0.5, 0.3)),
                    }),
                }]),
            }
        );
    }

    #[test]
    fn api_errors_surface_their_message() {
        let (msg, _) = translate(EngineEvent::Deleted {
            doc_id: "doc-a".into(),
            result: Err(api_error("Document not found")),
        });
        assert_eq!(
            msg,
            Msg::DeleteCompleted {
                doc_id: "doc-a".into(),
                result: Err("Document not found".into()),
            }
        );
    }
}
