use super::{display_date, load, parse_date};
use crate::{
    libs::{grouping::Dimension, messages::Message, view::View},
    msg_info, msg_print,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct GroupsArgs {
    /// Grouping dimension
    #[arg(short, long, value_enum, default_value = "operator")]
    by: Dimension,

    /// Day to inspect: `today` or YYYY-MM-DD
    #[arg(short, long, default_value = "today")]
    date: String,

    /// Only show groups with open or break-overlapping entries
    #[arg(long)]
    issues_only: bool,
}

pub async fn cmd(args: GroupsArgs) -> Result<()> {
    let date = parse_date(&args.date)?;
    let state = load(date).await?;

    let mut groups = state.groups_now(args.by);
    if args.issues_only {
        groups.retain(|group| group.has_issues);
    }

    msg_print!(Message::GroupsHeader(args.by.to_string(), display_date(date)), true);
    if groups.is_empty() {
        msg_info!(Message::NoGroups);
        return Ok(());
    }
    View::groups(&groups)
}
