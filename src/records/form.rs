//! The pages and endpoints for creating and editing records.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, UtcOffset};

use crate::{
    Error,
    api::SessionToken,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner,
    },
    navigation::NavBar,
    period::parse_date,
    record::{CoffeeType, Kind, PaymentStatus, Record, RecordDraft},
    source::DataState,
    timezone::local_today,
};

/// The form data for creating or editing a record.
///
/// Every field is kept as text so that validation errors can be reported
/// with a message instead of a bare 422 response.
#[derive(Debug, Default, Deserialize)]
pub struct RecordForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub coffee_type: String,
    /// Weight in grams.
    #[serde(default)]
    pub weight: String,
    /// Unit price, may contain thousands separators.
    #[serde(default)]
    pub price: String,
    /// Total price, may contain thousands separators. Defaults to the unit price.
    #[serde(default)]
    pub total_price: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub payment_status: String,
    /// The date of the record, e.g. "2024-03-10".
    #[serde(default)]
    pub date: String,
}

/// Keep only the digits of a price, so "1.500.000" and "1,500,000" both read
/// as 1500000.
fn parse_price(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();

    digits.parse::<u64>().ok().map(|price| price as f64)
}

impl RecordForm {
    /// Check the form and convert it into the data sent to the remote API.
    ///
    /// `existing` is the record being edited. Its original creation timestamp
    /// is kept when the date is unchanged so that editing a record does not
    /// move it to midnight.
    ///
    /// # Errors
    /// Returns [Error::InvalidForm] describing the first invalid field.
    pub fn into_draft(
        self,
        existing: Option<&Record>,
        local_offset: UtcOffset,
    ) -> Result<RecordDraft, Error> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(Error::InvalidForm(
                "Enter the name of the buyer or seller.".to_owned(),
            ));
        }

        let coffee_type = CoffeeType::from_wire_value(&self.coffee_type).ok_or_else(|| {
            Error::InvalidForm(format!("\"{}\" is not a known coffee type.", self.coffee_type))
        })?;

        let weight = self
            .weight
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|weight| weight.is_finite() && *weight >= 0.0)
            .ok_or_else(|| {
                Error::InvalidForm("The weight must be a number of grams, zero or more.".to_owned())
            })?;

        let price = parse_price(&self.price)
            .ok_or_else(|| Error::InvalidForm("Enter the price.".to_owned()))?;
        let total_price = parse_price(&self.total_price).unwrap_or(price);

        let kind = Kind::from_wire_value(&self.kind).ok_or_else(|| {
            Error::InvalidForm("Choose whether the record is a purchase or a sale.".to_owned())
        })?;

        let payment_status = match PaymentStatus::from_wire_value(&self.payment_status) {
            PaymentStatus::Other(_) => {
                return Err(Error::InvalidForm(
                    "Choose whether the record has been paid.".to_owned(),
                ));
            }
            status => status,
        };

        let date = parse_date(&self.date)
            .ok_or_else(|| Error::InvalidForm(format!("\"{}\" is not a valid date.", self.date)))?;
        let created_at = match existing {
            Some(record) if record.local_date(local_offset) == Some(date) => {
                record.created_at_value.clone()
            }
            _ => date.to_string(),
        };

        Ok(RecordDraft {
            name,
            external_id: self.external_id.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            coffee_type: coffee_type.as_wire_value().to_owned(),
            weight,
            price,
            total_price,
            kind,
            payment_status: payment_status.as_wire_value().to_owned(),
            created_at,
        })
    }
}

/// The values the form fields start with.
struct FormDefaults<'a> {
    name: &'a str,
    external_id: &'a str,
    phone: &'a str,
    coffee_type: Option<CoffeeType>,
    weight: Option<f64>,
    price: Option<f64>,
    total_price: Option<f64>,
    kind: Kind,
    payment_status: PaymentStatus,
    date: Date,
}

impl<'a> FormDefaults<'a> {
    fn new_record(today: Date) -> Self {
        Self {
            name: "",
            external_id: "",
            phone: "",
            coffee_type: None,
            weight: None,
            price: None,
            total_price: None,
            kind: Kind::Purchase,
            payment_status: PaymentStatus::Paid,
            date: today,
        }
    }

    fn from_record(record: &'a Record, local_offset: UtcOffset, today: Date) -> Self {
        Self {
            name: &record.name,
            external_id: &record.external_id,
            phone: &record.phone,
            coffee_type: record.coffee_type(),
            weight: Some(record.weight),
            price: Some(record.price),
            total_price: Some(record.total_price),
            kind: record.kind.unwrap_or(Kind::Purchase),
            payment_status: record.payment_status.clone(),
            date: record.local_date(local_offset).unwrap_or(today),
        }
    }
}

fn kind_radio(kind: Kind, checked: bool) -> Markup {
    let id = format!("kind-{}", kind.as_wire_value());

    html! {
        div class="flex items-center gap-3"
        {
            input
                name="kind"
                id=(id)
                type="radio"
                value=(kind.as_wire_value())
                checked[checked]
                required
                tabindex="0"
                class=(FORM_RADIO_INPUT_STYLE);

            label for=(id) class=(FORM_RADIO_LABEL_STYLE)
            {
                (kind.label())
            }
        }
    }
}

fn record_form_fields(defaults: &FormDefaults<'_>) -> Markup {
    let price = |value: Option<f64>| value.map(|value| format!("{value:.0}"));

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Kind" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                (kind_radio(Kind::Purchase, defaults.kind == Kind::Purchase))
                (kind_radio(Kind::Sale, defaults.kind == Kind::Sale))
            }
        }

        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Name" }

            input
                name="name"
                id="name"
                type="text"
                value=(defaults.name)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div class="grid grid-cols-2 gap-4"
        {
            div
            {
                label for="external_id" class=(FORM_LABEL_STYLE) { "ID number" }

                input
                    name="external_id"
                    id="external_id"
                    type="text"
                    value=(defaults.external_id)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="phone" class=(FORM_LABEL_STYLE) { "Phone" }

                input
                    name="phone"
                    id="phone"
                    type="tel"
                    value=(defaults.phone)
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="coffee_type" class=(FORM_LABEL_STYLE) { "Coffee type" }

            select name="coffee_type" id="coffee_type" required class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" selected[defaults.coffee_type.is_none()] { "Select a coffee type" }

                @for coffee_type in CoffeeType::ALL {
                    option
                        value=(coffee_type.as_wire_value())
                        selected[defaults.coffee_type == Some(coffee_type)]
                    {
                        (coffee_type.label())
                    }
                }
            }
        }

        div
        {
            label for="weight" class=(FORM_LABEL_STYLE) { "Weight (grams)" }

            input
                name="weight"
                id="weight"
                type="number"
                step="any"
                min="0"
                placeholder="0"
                value=[defaults.weight.map(|weight| weight.to_string())]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div class="grid grid-cols-2 gap-4"
        {
            div
            {
                label for="price" class=(FORM_LABEL_STYLE) { "Price" }

                input
                    name="price"
                    id="price"
                    type="text"
                    inputmode="numeric"
                    placeholder="1.500.000"
                    value=[price(defaults.price)]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="total_price" class=(FORM_LABEL_STYLE) { "Total price" }

                input
                    name="total_price"
                    id="total_price"
                    type="text"
                    inputmode="numeric"
                    placeholder="Same as price"
                    value=[price(defaults.total_price)]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div class="grid grid-cols-2 gap-4"
        {
            div
            {
                label for="payment_status" class=(FORM_LABEL_STYLE) { "Payment" }

                select name="payment_status" id="payment_status" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for status in [PaymentStatus::Paid, PaymentStatus::Pending] {
                        option
                            value=(status.as_wire_value())
                            selected[defaults.payment_status == status]
                        {
                            (status.label())
                        }
                    }
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    value=(defaults.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

/// Renders a record form page. `hx_attribute` picks the HTTP method.
fn record_form_view(
    title: &str,
    nav_endpoint: &str,
    hx_attribute: HxMethod<'_>,
    defaults: &FormDefaults<'_>,
    submit_text: &str,
) -> Markup {
    let nav_bar = NavBar::new(nav_endpoint).into_html();
    let spinner = loading_spinner();
    let fields = record_form_fields(defaults);

    let form = match hx_attribute {
        HxMethod::Post(url) => html! {
            form
                hx-post=(url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { (title) }
                (fields)
                (submit_button(&spinner, submit_text))
            }
        },
        HxMethod::Put(url) => html! {
            form
                hx-put=(url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { (title) }
                (fields)
                (submit_button(&spinner, submit_text))
            }
        },
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (form)
        }
    };

    base(title, &[], &content)
}

enum HxMethod<'a> {
    Post(&'a str),
    Put(&'a str),
}

fn submit_button(spinner: &Markup, text: &str) -> Markup {
    html! {
        button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
        {
            span id="indicator" class="inline htmx-indicator"
            {
                (spinner)
            }
            " " (text)
        }
    }
}

/// Renders the page for creating a record.
pub async fn get_new_record_page(State(state): State<DataState>) -> Result<Response, Error> {
    let (_, today) = local_today(&state.local_timezone)?;

    Ok(record_form_view(
        "New Record",
        endpoints::NEW_RECORD_VIEW,
        HxMethod::Post(endpoints::RECORDS_API),
        &FormDefaults::new_record(today),
        "Create Record",
    )
    .into_response())
}

/// Renders the page for editing a record.
pub async fn get_edit_record_page(
    State(state): State<DataState>,
    Extension(token): Extension<SessionToken>,
    Path(record_id): Path<String>,
) -> Result<Response, Error> {
    let (local_offset, today) = local_today(&state.local_timezone)?;
    let snapshot = state.store.snapshot(&state.api, &token).await?;
    let record = snapshot
        .records
        .iter()
        .find(|record| record.id == record_id)
        .ok_or(Error::NotFound)?;
    let update_url = format_endpoint(endpoints::RECORD, &record.id);

    Ok(record_form_view(
        "Edit Record",
        endpoints::RECORDS_VIEW,
        HxMethod::Put(&update_url),
        &FormDefaults::from_record(record, local_offset, today),
        "Save Changes",
    )
    .into_response())
}

fn redirect_to_records(state: &DataState, token: &SessionToken) -> Response {
    if let Err(error) = state.store.mark_stale(token) {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::RECORDS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for creating a record, redirects to the records view on success.
pub async fn create_record_endpoint(
    State(state): State<DataState>,
    Extension(token): Extension<SessionToken>,
    Form(form): Form<RecordForm>,
) -> Response {
    let local_offset = match local_today(&state.local_timezone) {
        Ok((local_offset, _)) => local_offset,
        Err(error) => return error.into_alert_response(),
    };

    let draft = match form.into_draft(None, local_offset) {
        Ok(draft) => draft,
        Err(error) => {
            tracing::debug!("Rejected new record: {error}");
            return error.into_alert_response();
        }
    };

    if let Err(error) = state.api.create_record(&token, &draft).await {
        tracing::error!("Could not create record: {error}");
        return error.into_alert_response();
    }

    tracing::info!("Created {} record for {}", draft.kind.label(), draft.name);
    redirect_to_records(&state, &token)
}

/// A route handler for replacing a record, redirects to the records view on success.
pub async fn update_record_endpoint(
    State(state): State<DataState>,
    Extension(token): Extension<SessionToken>,
    Path(record_id): Path<String>,
    Form(form): Form<RecordForm>,
) -> Response {
    let local_offset = match local_today(&state.local_timezone) {
        Ok((local_offset, _)) => local_offset,
        Err(error) => return error.into_alert_response(),
    };

    let snapshot = match state.store.snapshot(&state.api, &token).await {
        Ok(snapshot) => snapshot,
        Err(error) => return error.into_alert_response(),
    };
    let existing = snapshot.records.iter().find(|record| record.id == record_id);

    let draft = match form.into_draft(existing, local_offset) {
        Ok(draft) => draft,
        Err(error) => {
            tracing::debug!("Rejected edit of record {record_id}: {error}");
            return error.into_alert_response();
        }
    };

    if let Err(error) = state.api.update_record(&token, &record_id, &draft).await {
        tracing::error!("Could not update record {record_id}: {error}");
        return error.into_alert_response();
    }

    tracing::info!("Updated record {record_id}");
    redirect_to_records(&state, &token)
}
