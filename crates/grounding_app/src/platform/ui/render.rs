//! Plain-text rendering of the view model.

use std::fmt::Write;

use grounding_core::{
    AppViewModel, BatchView, ChatRole, ChunkCardView, NavigationOutcome, OverlayView, TaskStatus,
};

use super::constants::{RULE, TEXT_PREVIEW_CHARS};

pub fn render_documents(view: &AppViewModel) -> String {
    let mut out = String::new();
    if view.documents.is_empty() {
        out.push_str("No documents uploaded yet.\n");
        return out;
    }
    let _ = writeln!(out, "Documents ({})", view.documents.len());
    for row in &view.documents {
        let marker = if row.active { '*' } else { ' ' };
        let _ = writeln!(out, "{marker} {}  {}", row.doc_id, row.filename);
    }
    out
}

pub fn render_viewer(view: &AppViewModel) -> String {
    let mut out = String::new();
    let Some(active) = &view.active else {
        out.push_str("No document open.\n");
        return out;
    };

    let _ = writeln!(out, "{} ({})", active.display_name, active.doc_id);
    let pages = match active.page_count {
        Some(count) => format!("{count} page(s)"),
        None => "pages not laid out".to_string(),
    };
    let _ = writeln!(
        out,
        "Zoom {} | {} | list {:.0}% / pages {:.0}%",
        view.zoom_label,
        pages,
        view.left_width_percent,
        100.0 - view.left_width_percent
    );
    if let Some(path) = &active.cached_path {
        let _ = writeln!(out, "Cached at {}", path.display());
    }
    out.push_str(RULE);
    out.push('\n');

    if active.loading_chunks {
        out.push_str("Loading chunks...\n");
    } else if view.chunks.is_empty() {
        out.push_str("No chunks found for this document.\n");
    }
    for card in &view.chunks {
        render_card(&mut out, card);
    }

    if !view.overlays.is_empty() {
        out.push_str(RULE);
        out.push('\n');
        let _ = writeln!(out, "Overlays ({})", view.overlays.len());
        for overlay in &view.overlays {
            render_overlay(&mut out, overlay);
        }
    }
    out
}

fn render_card(out: &mut String, card: &ChunkCardView) {
    let marker = if card.selected {
        '>'
    } else if card.hovered {
        '~'
    } else {
        ' '
    };
    let region = if card.has_overlay { "" } else { " (no region)" };
    let _ = writeln!(
        out,
        "{marker} [{}] {} | {} | key {}{}",
        card.index, card.page_label, card.chunk_type, card.key, region
    );
    let _ = writeln!(out, "    {}", preview(&card.text));
}

fn render_overlay(out: &mut String, overlay: &OverlayView) {
    let state = if overlay.selected {
        " selected"
    } else if overlay.hovered {
        " hovered"
    } else {
        ""
    };
    let _ = writeln!(
        out,
        "  [{}] page {} at {:.1}%,{:.1}% size {:.1}% x {:.1}%{}",
        overlay.index,
        u64::from(overlay.page) + 1,
        overlay.left_pct,
        overlay.top_pct,
        overlay.width_pct,
        overlay.height_pct,
        state
    );
}

pub fn render_search(view: &AppViewModel) -> String {
    let mut out = String::new();
    let search = &view.search;
    if search.searching {
        let _ = writeln!(out, "Searching for \"{}\"...", search.query);
        return out;
    }
    if !search.visible {
        return out;
    }
    if search.results.is_empty() {
        let _ = writeln!(out, "No results for \"{}\".", search.query);
        return out;
    }
    let _ = writeln!(
        out,
        "{} result(s) for \"{}\"",
        search.results.len(),
        search.query
    );
    for (position, result) in search.results.iter().enumerate() {
        let _ = writeln!(
            out,
            "{position:>3}. {:.0}% | {} | Page {} | {}",
            result.score * 100.0,
            result.doc_id,
            result.page_number,
            result.chunk_type
        );
        let _ = writeln!(out, "     {}", preview(&result.text));
    }
    out
}

pub fn render_chat(view: &AppViewModel) -> String {
    let mut out = String::new();
    for message in &view.chat {
        let who = match message.role {
            ChatRole::User => "you",
            ChatRole::Assistant => "assistant",
        };
        let _ = writeln!(out, "{who}: {}", message.content);
        for (position, source) in message.sources.iter().enumerate() {
            let name = source.filename.as_deref().unwrap_or(&source.doc_id);
            let _ = writeln!(
                out,
                "    source {position}: {name}, Page {} ({})",
                u64::from(source.page) + 1,
                source.chunk_type
            );
        }
    }
    if view.chat_waiting {
        out.push_str("assistant is thinking...\n");
    }
    out
}

pub fn render_batch(batch: &BatchView) -> String {
    let mut out = String::new();
    let stats = batch.stats;
    let _ = writeln!(
        out,
        "Batch: {} total, {} pending, {} processing, {} done, {} failed",
        stats.total, stats.pending, stats.processing, stats.success, stats.error
    );
    for task in &batch.tasks {
        let _ = writeln!(
            out,
            "  #{:<3} {:>3}% {:<10} {} ({}){}",
            task.id,
            task.progress,
            status_label(task.status),
            task.name,
            task.size_label,
            match &task.remote_doc_id {
                Some(doc_id) => format!(" -> {doc_id}"),
                None => String::new(),
            }
        );
        if task.status == TaskStatus::Error {
            let _ = writeln!(out, "       {}", task.status_text);
        }
    }
    if let Some(summary) = batch.last_summary {
        let _ = writeln!(
            out,
            "Processed {} of {} document(s) successfully.",
            summary.success_count, summary.total
        );
    }
    out
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Uploading => "uploading",
        TaskStatus::Parsing => "parsing",
        TaskStatus::Indexing => "indexing",
        TaskStatus::Success => "done",
        TaskStatus::Error => "failed",
    }
}

pub fn render_review(view: &AppViewModel) -> String {
    let mut out = String::new();
    let review = &view.review;
    if review.extracting {
        out.push_str("Extracting structured data...\n");
    }
    if let Some(data) = &review.extracted {
        out.push_str(data);
        if !data.ends_with('\n') {
            out.push('\n');
        }
    }
    if review.saving {
        out.push_str("Saving review...\n");
    }
    if let Some(status) = &review.save_status {
        let _ = writeln!(out, "Saved: {status}");
    }
    if let Some(err) = &review.error {
        let _ = writeln!(out, "Error: {err}");
    }
    out
}

/// Banner and navigation notice; empty when there is nothing to report.
pub fn render_notices(view: &AppViewModel) -> String {
    let mut out = String::new();
    if let Some(banner) = &view.banner {
        let _ = writeln!(out, "Error: {banner}");
    }
    match &view.navigation {
        Some(NavigationOutcome::SourceUnavailable { doc_id, chunk_key }) => {
            let _ = writeln!(
                out,
                "Note: source chunk {chunk_key} is no longer available in {doc_id}."
            );
        }
        Some(NavigationOutcome::LoadFailed { doc_id }) => {
            let _ = writeln!(out, "Note: could not open {doc_id}.");
        }
        Some(NavigationOutcome::Selected { .. }) | None => {}
    }
    out
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= TEXT_PREVIEW_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(TEXT_PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}
