use super::{display_date, load, parse_date};
use crate::{
    libs::{messages::Message, view::View},
    msg_print,
};
use anyhow::Result;
use chrono::Local;
use clap::Args;

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Day to inspect: `today` or YYYY-MM-DD
    #[arg(short, long, default_value = "today")]
    date: String,
}

pub async fn cmd(args: SummaryArgs) -> Result<()> {
    let date = parse_date(&args.date)?;
    let state = load(date).await?;

    msg_print!(Message::SummaryHeader(display_date(date)), true);
    View::summary(&state.summary())?;
    View::shift(&state.elapsed(Local::now().naive_local()))
}
