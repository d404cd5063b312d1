use claimcheck_core::{ApprovalTicket, TicketStatus};
use tera::{Context, Tera};

const APPROVED_PAGE: &str = "pages/approved.html";
const REJECTED_PAGE: &str = "pages/rejected.html";

/// Confirmation pages shown after a customer clicks an email action link.
pub struct DecisionPages {
    tera: Tera,
}

impl DecisionPages {
    pub fn embedded() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (APPROVED_PAGE, include_str!("../../../templates/pages/approved.html")),
            (REJECTED_PAGE, include_str!("../../../templates/pages/rejected.html")),
        ])?;
        Ok(Self { tera })
    }

    /// `already_recorded` marks a repeated click on a ticket that was resolved earlier.
    pub fn render(
        &self,
        ticket: &ApprovalTicket,
        already_recorded: bool,
    ) -> Result<String, tera::Error> {
        let template = match ticket.status {
            TicketStatus::Approved => APPROVED_PAGE,
            TicketStatus::Rejected => REJECTED_PAGE,
            TicketStatus::Pending => {
                return Err(tera::Error::msg(format!(
                    "ticket `{}` is still pending; no decision page to show",
                    ticket.ticket_id
                )))
            }
        };

        let mut context = Context::new();
        context.insert("ticket_id", ticket.ticket_id.as_str());
        context.insert("claim_id", &ticket.claim_id.0);
        context.insert("already_recorded", &already_recorded);
        context.insert("updated_at", &ticket.updated_at.format("%Y-%m-%d %H:%M UTC").to_string());
        self.tera.render(template, &context)
    }
}
