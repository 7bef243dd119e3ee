//! Discovery: which sale leads can be imported right now, and per-list coverage.

use std::collections::HashSet;

use leadsync_core::{DiscoveryResponse, ListSummary, SourceLead};
use tracing::{debug, info, warn};

use crate::error::UpstreamError;
use crate::source::{CallCenter, SourceList};

fn is_retained(list: &SourceList) -> bool {
    let name = list.list_name.trim();
    if name.eq_ignore_ascii_case("TEST") {
        return false;
    }
    let id = list.list_id.trim();
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

/// Collect sale leads from every active list.
///
/// Lists named `TEST` or with non-numeric ids are dropped. Inactive lists
/// still show up in the summary with a zero count. When `counts_only` is
/// false, leads without an email get one backfilled from the lead detail
/// endpoint.
pub async fn discover(
    call_center: &dyn CallCenter,
    counts_only: bool,
) -> Result<DiscoveryResponse, UpstreamError> {
    let lists = call_center.lists().await?;
    let mut summaries = Vec::new();
    let mut sale_leads = Vec::new();
    let mut seen = HashSet::new();

    for list in lists.into_iter().filter(is_retained) {
        let mut count = 0;
        if list.active {
            let leads = call_center.sale_leads(&list.list_id).await?;
            debug!(list_id = %list.list_id, fetched = leads.len(), "list leads fetched");
            for mut lead in leads.into_iter().filter(|l| l.sale) {
                let Ok(identity) = lead.identity().map(str::to_string) else {
                    warn!(list_id = %list.list_id, "skipping sale lead without id");
                    continue;
                };
                count += 1;
                if !seen.insert(identity) {
                    continue;
                }
                lead.list_id.get_or_insert_with(|| list.list_id.clone());
                lead.list_name.get_or_insert_with(|| list.list_name.clone());
                if !counts_only {
                    backfill_email(call_center, &mut lead).await;
                }
                sale_leads.push(lead);
            }
        }
        summaries.push(ListSummary {
            list_id: list.list_id,
            list_name: list.list_name,
            lead_count: count,
            active: list.active,
        });
    }

    info!(
        lists = summaries.len(),
        sale_leads = sale_leads.len(),
        counts_only,
        "discovery finished"
    );
    Ok(DiscoveryResponse::new(sale_leads, summaries))
}

async fn backfill_email(call_center: &dyn CallCenter, lead: &mut SourceLead) {
    if lead.email.as_deref().is_some_and(|e| !e.trim().is_empty()) {
        return;
    }
    match call_center.lead_detail(&lead.id).await {
        Ok(detail) => {
            if let Some(email) = detail.email.filter(|e| !e.trim().is_empty()) {
                lead.email = Some(email);
            }
        }
        Err(e) => warn!(lead_id = %lead.id, error = %e, "email backfill failed"),
    }
}
