use crate::output::Output;
use crate::session::Session;
use crate::Position;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use movielist_core::{MutationOutcome, Mutations};
use movielist_models::{ListId, RecordOption};

/// Store refreshed tokens, then turn the outcome into the exit status. The
/// notifier has already shown the details.
pub(crate) async fn finish(session: &mut Session, outcome: MutationOutcome) -> Result<()> {
    session.save_tokens().await?;
    match outcome {
        MutationOutcome::Committed | MutationOutcome::Skipped => Ok(()),
        MutationOutcome::RolledBack(e) | MutationOutcome::Failed(e) => Err(eyre!("{}", e.user_message())),
    }
}

async fn open(output: &Output) -> Result<(Session, Mutations)> {
    let mut session = Session::open().await?;
    let mutations = session.own_records(output).await?;
    Ok((session, mutations))
}

pub async fn run_rate(record_id: i64, rating: u8, output: &Output) -> Result<()> {
    let (mut session, mutations) = open(output).await?;
    let outcome = mutations.change_rating(record_id, rating).await;
    if outcome.is_committed() {
        output.success(format!("Rated record {} with {}", record_id, crate::render::stars(rating)));
    }
    finish(&mut session, outcome).await
}

pub async fn run_option(record_id: i64, option: RecordOption, value: Option<bool>, output: &Output) -> Result<()> {
    let (mut session, mutations) = open(output).await?;

    if let (Some(value), Some(record)) = (value, mutations.store().get(record_id).await) {
        if record.options.get(option) == value {
            output.info(format!("{} is already {}", option, if value { "on" } else { "off" }));
            return Ok(());
        }
    }

    let outcome = mutations.toggle_option(record_id, option).await;
    if outcome.is_committed() {
        if let Some(record) = mutations.store().get(record_id).await {
            let state = if record.options.get(option) { "on" } else { "off" };
            output.success(format!("{} turned {} for {}", option, state, record.movie.title));
        }
    }
    finish(&mut session, outcome).await
}

pub async fn run_comment(record_id: i64, text: String, output: &Output) -> Result<()> {
    let (mut session, mutations) = open(output).await?;

    if !mutations.set_comment(record_id, text).await {
        return Err(eyre!("Record {} not found", record_id));
    }
    let outcome = mutations
        .spawn_save_comment(record_id)
        .await
        .map_err(|e| eyre!("Comment task failed: {}", e))?;
    if outcome.is_committed() {
        output.success("Comment saved");
    }
    finish(&mut session, outcome).await
}

pub async fn run_remove(record_id: i64, output: &Output) -> Result<()> {
    let (mut session, mutations) = open(output).await?;
    let outcome = mutations.remove_record(record_id).await;
    finish(&mut session, outcome).await
}

pub async fn run_add(movie_id: i64, list: ListId, record_id: Option<i64>, output: &Output) -> Result<()> {
    let (mut session, mutations) = open(output).await?;
    let outcome = mutations.add_to_list(movie_id, list, record_id).await;
    finish(&mut session, outcome).await
}

pub async fn run_add_external(movie_id: i64, list: ListId, output: &Output) -> Result<()> {
    let (mut session, mutations) = open(output).await?;
    let outcome = mutations.add_from_db(movie_id, list, None).await;
    finish(&mut session, outcome).await
}

pub async fn run_move(record_id: i64, position: Position, output: &Output) -> Result<()> {
    let (mut session, mutations) = open(output).await?;
    let outcome = match position {
        Position::Top => mutations.move_to_top(record_id).await,
        Position::Bottom => mutations.move_to_bottom(record_id).await,
    };
    if outcome.is_committed() {
        let place = match position {
            Position::Top => "top",
            Position::Bottom => "bottom",
        };
        output.success(format!("Moved record {} to the {} of its list", record_id, place));
    }
    finish(&mut session, outcome).await
}
