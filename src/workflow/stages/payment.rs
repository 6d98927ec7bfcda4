//! 付款单策略

use chrono::Duration;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::Value;

use crate::error::MasterDataError;
use crate::models::payload::{PaymentEntryPayload, PaymentReference};
use crate::models::{DocumentStatus, LineItem, StageDetails, StageDocument, StageType};
use crate::workflow::run_ctx::{MonthCtx, RunContext};
use crate::workflow::stages::invoice::PAYMENT_TERM_DAYS;
use crate::workflow::strategy::{committed_id, format_date, StageStrategy};

pub struct PaymentStrategy<'a> {
    run: &'a RunContext,
}

impl<'a> PaymentStrategy<'a> {
    pub fn new(run: &'a RunContext) -> Self {
        Self { run }
    }
}

impl StageStrategy for PaymentStrategy<'_> {
    fn stage(&self) -> StageType {
        StageType::Payment
    }

    fn build(
        &self,
        upstream: Option<&StageDocument>,
        seq: usize,
        ctx: &MonthCtx,
        rng: &mut StdRng,
    ) -> Result<StageDocument, MasterDataError> {
        let invoice = upstream.ok_or_else(|| MasterDataError::UpstreamUncommitted {
            natural_key: self.natural_key(seq, ctx),
        })?;
        let invoice_id = committed_id(invoice)?;

        let (due_date, credit_to) = match &invoice.details {
            StageDetails::Invoice {
                due_date,
                credit_to,
                ..
            } => (*due_date, credit_to.clone()),
            _ => (
                invoice.posting_date + Duration::days(PAYMENT_TERM_DAYS),
                self.run.settings.credit_to_account.clone(),
            ),
        };

        // 付款日落在 [开票日, min(到期日, 开票日+30)]，再截到月末
        let latest = due_date.min(invoice.posting_date + Duration::days(PAYMENT_TERM_DAYS));
        let span = (latest - invoice.posting_date).num_days().max(0);
        let posting_date = (invoice.posting_date + Duration::days(rng.random_range(0..=span)))
            .min(ctx.month_end)
            .max(invoice.posting_date);

        let reference_no = format!(
            "REF-{}-{}",
            posting_date.format("%Y%m%d"),
            rng.random_range(1000..=9999)
        );

        let line_items: Vec<LineItem> = invoice
            .line_items
            .iter()
            .map(|line| {
                let mut paid = line.clone();
                paid.upstream_line = line.remote_id.clone();
                paid.remote_id = None;
                paid
            })
            .collect();

        Ok(StageDocument {
            stage_type: StageType::Payment,
            natural_key: self.natural_key(seq, ctx),
            party_reference: invoice.party_reference.clone(),
            posting_date,
            line_items,
            tax_lines: invoice.tax_lines.clone(),
            upstream_reference: Some(invoice_id),
            origin_reference: invoice.origin_reference.clone(),
            assigned_id: None,
            status: DocumentStatus::Pending,
            details: StageDetails::Payment {
                paid_amount: invoice.gross_amount(),
                reference_no,
                reference_date: posting_date,
                paid_from: self.run.settings.bank_account.clone(),
                paid_to: credit_to,
            },
        })
    }

    fn to_payload(&self, doc: &StageDocument) -> Result<Value, serde_json::Error> {
        let settings = &self.run.settings;
        let (paid_amount, reference_no, reference_date, paid_from, paid_to) = match &doc.details {
            StageDetails::Payment {
                paid_amount,
                reference_no,
                reference_date,
                paid_from,
                paid_to,
            } => (
                *paid_amount,
                reference_no.clone(),
                *reference_date,
                paid_from.clone(),
                paid_to.clone(),
            ),
            _ => (
                doc.gross_amount(),
                String::new(),
                doc.posting_date,
                settings.bank_account.clone(),
                settings.credit_to_account.clone(),
            ),
        };

        let payload = PaymentEntryPayload {
            doctype: StageType::Payment.doctype(),
            naming_series: "ACC-PAY-.YYYY.-",
            payment_type: "Pay",
            posting_date: format_date(doc.posting_date),
            company: settings.company.clone(),
            party_type: "Supplier",
            party: doc.party_reference.clone(),
            paid_from,
            paid_to,
            paid_amount,
            received_amount: paid_amount,
            source_exchange_rate: settings.conversion_rate,
            target_exchange_rate: settings.conversion_rate,
            paid_from_account_currency: settings.currency.clone(),
            paid_to_account_currency: settings.currency.clone(),
            reference_no,
            reference_date: format_date(reference_date),
            references: vec![PaymentReference {
                reference_doctype: StageType::Invoice.doctype(),
                reference_name: doc.upstream_reference.clone().unwrap_or_default(),
                total_amount: paid_amount,
                allocated_amount: paid_amount,
            }],
            taxes: Vec::new(),
            docstatus: 1,
        };

        serde_json::to_value(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::stages::test_support::{committed_invoice, month_ctx, run_context};
    use chrono::NaiveDate;
    use rand::SeedableRng;

    #[test]
    fn paid_amount_is_invoice_gross() {
        let run = run_context();
        let strategy = PaymentStrategy::new(&run);
        let mut rng = StdRng::seed_from_u64(8);
        let invoice = committed_invoice(NaiveDate::from_ymd_opt(2023, 1, 4).unwrap());

        let payment = strategy
            .build(Some(&invoice), 0, &month_ctx(2023, 1), &mut rng)
            .unwrap();
        match &payment.details {
            StageDetails::Payment {
                paid_amount,
                reference_no,
                paid_from,
                paid_to,
                ..
            } => {
                assert_eq!(*paid_amount, 5950.0);
                assert!(reference_no.starts_with("REF-202301"));
                assert_eq!(reference_no.len(), "REF-20230101-1000".len());
                assert_eq!(paid_from, "Bank Account - B");
                assert_eq!(paid_to, "3500 - Sonstige Verb. - B");
            }
            other => panic!("unexpected details: {:?}", other),
        }
        assert_eq!(payment.line_items.len(), invoice.line_items.len());
        assert_eq!(payment.origin_reference.as_deref(), Some("PUR-ORD-0001"));
    }

    #[test]
    fn payment_date_stays_between_invoice_and_month_end() {
        let run = run_context();
        let strategy = PaymentStrategy::new(&run);
        let mut rng = StdRng::seed_from_u64(21);
        let ctx = month_ctx(2023, 2);

        for day in [1, 14, 27, 28] {
            let invoice_date = NaiveDate::from_ymd_opt(2023, 2, day).unwrap();
            let invoice = committed_invoice(invoice_date);
            let payment = strategy.build(Some(&invoice), 0, &ctx, &mut rng).unwrap();

            assert!(payment.posting_date >= invoice_date);
            assert!(payment.posting_date <= ctx.month_end);
        }
    }

    #[test]
    fn payload_references_the_invoice() {
        let run = run_context();
        let strategy = PaymentStrategy::new(&run);
        let mut rng = StdRng::seed_from_u64(8);
        let invoice = committed_invoice(NaiveDate::from_ymd_opt(2023, 1, 4).unwrap());
        let payment = strategy
            .build(Some(&invoice), 0, &month_ctx(2023, 1), &mut rng)
            .unwrap();

        let payload = strategy.to_payload(&payment).unwrap();
        assert_eq!(payload["payment_type"], "Pay");
        assert_eq!(payload["party_type"], "Supplier");
        assert_eq!(payload["references"][0]["reference_doctype"], "Purchase Invoice");
        assert_eq!(payload["references"][0]["reference_name"], "ACC-PINV-0001");
        assert_eq!(payload["paid_amount"], 5950.0);
    }
}
