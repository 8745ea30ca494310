//! Derived view state: what a front end needs to draw a roster.

use serde::Serialize;

use crate::context::PartyContext;
use crate::roster::Roster;
use crate::search::GuestFilter;

/// One rendered guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestRow {
    pub id: i64,
    pub name: String,
    pub added_by: String,
    /// Show the remove button: the viewer is the host and the party hasn't started.
    pub removable: bool,
    /// Show the checked-in badge: the party has started and the guest is here.
    pub checked_in: bool,
    /// Rejected by the current search.
    pub hidden: bool,
}

/// The number shown next to a roster.
pub fn headcount(roster: &Roster, ctx: &PartyContext) -> usize {
    roster.headcount(ctx.party_started())
}

pub fn guest_rows(roster: &Roster, ctx: &PartyContext, filter: &GuestFilter) -> Vec<GuestRow> {
    let started = ctx.party_started();
    let me = ctx.me().full_name();

    roster
        .guests()
        .iter()
        .filter_map(|g| {
            Some(GuestRow {
                id: g.id?,
                name: g.name.clone(),
                added_by: format!("Added by {}", g.host),
                removable: !started && g.is_hosted_by(&me),
                checked_in: started && g.is_at_party,
                hidden: !filter.matches(g),
            })
        })
        .collect()
}
