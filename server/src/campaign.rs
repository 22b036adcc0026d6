use crate::{
    config::{self, BankAccountConfig, CampaignConfig},
    money::CurrencyUnit,
    notify::escape_html,
    progress,
};
use rust_decimal::Decimal;
use std::{fmt::Write, sync::Arc};

/// The fundraising campaign the bot posts about.
pub struct Campaign {
    title: String,
    description: String,
    accounts: Vec<BankAccountConfig>,
    photo_url: Option<String>,
    target: Decimal,
    bar_length: usize,
    unit: Arc<CurrencyUnit>,
}

impl Campaign {
    pub fn from_config(config: &CampaignConfig) -> Result<Self, config::Error> {
        if config.target <= Decimal::ZERO {
            return Err(config::Error::InvalidTarget(config.target));
        }
        if config.bar_length == 0 {
            return Err(config::Error::InvalidBarLength);
        }
        let unit = CurrencyUnit::new(config.currency()?, config.symbol.clone());
        Ok(Self {
            title: config.title.clone(),
            description: config.description.clone(),
            accounts: config.accounts.clone(),
            photo_url: config.photo_url.clone(),
            target: config.target,
            bar_length: config.bar_length,
            unit: Arc::new(unit),
        })
    }

    pub fn unit(&self) -> &Arc<CurrencyUnit> {
        &self.unit
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    pub fn progress(&self, total: Decimal) -> Result<String, progress::Error> {
        progress::render(total, self.target, self.bar_length, &self.unit)
    }

    /// Full campaign post. Title and description are trusted HTML from the
    /// operator's config.
    pub fn post(&self, total: Decimal) -> Result<String, progress::Error> {
        let mut text = format!("<b>{}</b>\n\n", self.title);
        if !self.description.is_empty() {
            text.push_str(&self.description);
            text.push_str("\n\n");
        }
        if !self.accounts.is_empty() {
            text.push_str("Donations:\n");
            for account in &self.accounts {
                let _ = write!(
                    text,
                    "{} <code>{}</code>",
                    escape_html(&account.bank),
                    escape_html(&account.iban)
                );
                if let Some(holder) = &account.holder {
                    let _ = write!(text, " {}", escape_html(holder));
                }
                text.push('\n');
            }
            text.push('\n');
        }
        text.push_str(&self.progress(total)?);
        text.push_str("\n\nPress the button below to report your transfer!");
        Ok(text)
    }
}
