// crates/conduit-deepmock/src/generator.rs
// ============================================================================
// Module: Random Record Generator
// Description: Schema-driven random values with validate-and-retry.
// Purpose: Produce records that conform to an object's JSON Schema.
// Dependencies: conduit-core, rand, rand_regex, regex, time, uuid, tracing
// ============================================================================

//! ## Overview
//! [`RecordGenerator`] walks the typed schema model and draws a value for
//! every declared property, optional ones included. The candidate record is
//! validated against the compiled schema; invalid candidates are discarded
//! and regenerated up to the retry limit.
//!
//! Every call owns one RNG. With a configured seed the RNG of the n-th call is
//! seeded from `seed + n`, so a run is reproducible end to end.
//!
//! Id and updated fields bypass random drawing: ids are UUIDs, or monotonic
//! nanosecond readings for integer ids, and timestamps are the current time.
//!
//! ## Invariants
//! - A returned record passed schema validation.
//! - Arrays with `uniqueItems` never contain two elements with equal JSON text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use conduit_core::ConnectorError;
use conduit_core::ExclusiveBound;
use conduit_core::InputSchema;
use conduit_core::Record;
use conduit_core::SchemaNode;
use conduit_core::Timestamp;
use conduit_core::monotonic_nanos;
use rand::Rng;
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::config::DEFAULT_MAX_DEPTH;
use crate::config::DEFAULT_MAX_RETRIES;
use crate::config::DeepMockConfig;
use crate::registry::SchemaEntry;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Regex draws attempted before falling back to free text.
const PATTERN_ATTEMPTS: usize = 3;
/// Draws attempted per unique array element.
const UNIQUE_ATTEMPTS: usize = 10;
/// Maximum repetition expanded for unbounded regex quantifiers.
const MAX_PATTERN_REPEAT: u32 = 16;
/// Magnitude of default numeric bounds.
const DEFAULT_BOUND: i64 = 1000;
/// Exclusive-bound adjustment for non-integer numbers.
const NUMBER_EPSILON: f64 = 0.001;
/// Default minimum array length.
const DEFAULT_MIN_ITEMS: u64 = 1;
/// Default maximum array length.
const DEFAULT_MAX_ITEMS: u64 = 3;
/// `$ref` hops followed before a reference chain is rejected.
const MAX_REF_HOPS: usize = 16;
/// Filler emitted where recursion stops.
const PLACEHOLDER: &str = "placeholder";
/// Span of generated dates, in seconds before now (about three years).
const DATE_SPAN_SECONDS: i64 = 3 * 365 * 24 * 60 * 60;

// ============================================================================
// SECTION: Vocabulary
// ============================================================================

/// Given names.
const FIRST_NAMES: &[&str] =
    &["Alice", "Bruno", "Chen", "Dana", "Emeka", "Freya", "Gita", "Hugo", "Ines", "Jonas"];
/// Family names.
const LAST_NAMES: &[&str] =
    &["Abara", "Berg", "Costa", "Dubois", "Eriksen", "Fischer", "Garcia", "Haddad", "Ito"];
/// Lower-case words.
const WORDS: &[&str] = &[
    "amber", "basin", "cedar", "delta", "ember", "fjord", "grove", "harbor", "island", "juniper",
    "kernel", "lumen", "meadow", "nectar", "orbit", "prairie", "quartz", "ridge", "summit",
    "tundra",
];
/// Countries.
const COUNTRIES: &[&str] = &["Brazil", "Canada", "Germany", "India", "Japan", "Kenya", "Norway"];
/// Cities.
const CITIES: &[&str] = &["Austin", "Bergen", "Lagos", "Lyon", "Osaka", "Porto", "Pune"];
/// Street suffixes.
const STREET_SUFFIXES: &[&str] = &["Street", "Avenue", "Road", "Lane", "Way"];
/// Letters used to pad short strings.
const PAD_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Schema-driven random record generator.
#[derive(Debug)]
pub struct RecordGenerator {
    /// Attempts per record before failing.
    max_retries: u32,
    /// Nesting depth at which placeholders are emitted.
    max_depth: usize,
    /// Base seed, or entropy when absent.
    seed: Option<u64>,
    /// Calls made so far; offsets the seed.
    calls: AtomicU64,
}

impl Default for RecordGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_MAX_DEPTH, None)
    }
}

impl RecordGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new(max_retries: u32, max_depth: usize, seed: Option<u64>) -> Self {
        Self {
            max_retries: max_retries.max(1),
            max_depth: max_depth.max(1),
            seed,
            calls: AtomicU64::new(0),
        }
    }

    /// Creates a generator from deep-mock settings.
    #[must_use]
    pub fn from_config(config: &DeepMockConfig) -> Self {
        Self::new(config.max_retries, config.max_depth, config.seed)
    }

    /// Generates a record that validates against the entry's schema.
    ///
    /// # Errors
    ///
    /// Returns schema errors ([`ConnectorError::InvalidSchema`],
    /// [`ConnectorError::UniqueConstraint`], [`ConnectorError::UniqueValue`])
    /// immediately, and [`ConnectorError::GenerationFailed`] with the last
    /// validation failure once every attempt is spent.
    pub fn generate_record(&self, entry: &SchemaEntry) -> Result<Record, ConnectorError> {
        let mut rng = self.call_rng();
        let mut last_failure = String::new();
        for _ in 0 .. self.max_retries {
            let record = self.candidate(&mut rng, entry)?;
            match entry.validator().validate(&Value::Object(record.clone())) {
                Ok(()) => return Ok(record),
                Err(err) => last_failure = err.detail(),
            }
        }
        debug!(
            object = entry.object_name(),
            attempts = self.max_retries,
            reason = %last_failure,
            "random record generation exhausted its retries"
        );
        Err(ConnectorError::GenerationFailed {
            attempts: self.max_retries,
            reason: last_failure,
        })
    }

    /// Draws one value for a standalone schema, without validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidSchema`] for unsatisfiable bounds or
    /// unresolvable references, and the uniqueness errors of array generation.
    pub fn generate_value(&self, schema: &InputSchema) -> Result<Value, ConnectorError> {
        let mut rng = self.call_rng();
        self.value(&mut rng, schema, schema, 0)
    }

    /// Returns the RNG for one call.
    fn call_rng(&self) -> StdRng {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(call)),
            None => StdRng::from_entropy(),
        }
    }

    /// Draws one candidate record.
    fn candidate(&self, rng: &mut StdRng, entry: &SchemaEntry) -> Result<Record, ConnectorError> {
        let root = entry.schema();
        let mut record = Record::new();
        for (name, node) in &root.properties {
            let value = if entry.id_field() == Some(name.as_str()) {
                generate_id(root, name)
            } else if entry.updated_field() == Some(name.as_str()) {
                generate_timestamp(root, name)?
            } else {
                match node {
                    SchemaNode::Bool(false) => continue,
                    SchemaNode::Bool(true) => Value::String(word(rng).to_string()),
                    SchemaNode::Schema(schema) => self.value(rng, root, schema, 1)?,
                }
            };
            record.insert(name.clone(), value);
        }
        Ok(record)
    }

    /// Draws a value for `schema` at nesting `depth`.
    fn value(
        &self,
        rng: &mut StdRng,
        root: &InputSchema,
        schema: &InputSchema,
        depth: usize,
    ) -> Result<Value, ConnectorError> {
        let schema = resolve(root, schema)?;
        if let Some(constant) = &schema.const_value {
            return Ok(constant.clone());
        }
        if let Some(values) = &schema.enum_values {
            return values
                .choose(rng)
                .cloned()
                .ok_or_else(|| ConnectorError::InvalidSchema("enum must not be empty".to_string()));
        }
        match infer_type(schema) {
            "string" => Ok(Value::String(string_value(rng, schema))),
            "integer" => integer_value(rng, schema).map(Value::from),
            "number" => number_value(rng, schema),
            "boolean" => Ok(Value::Bool(rng.gen_bool(0.5))),
            "null" => Ok(Value::Null),
            "array" => self.array_value(rng, root, schema, depth),
            "object" => self.object_value(rng, root, schema, depth),
            _ => self.composed_value(rng, root, schema, depth),
        }
    }

    /// Draws from an `anyOf`/`oneOf` branch or the first `allOf` member.
    fn composed_value(
        &self,
        rng: &mut StdRng,
        root: &InputSchema,
        schema: &InputSchema,
        depth: usize,
    ) -> Result<Value, ConnectorError> {
        let branches = if schema.any_of.is_empty() { &schema.one_of } else { &schema.any_of };
        let branch = branches.choose(rng).or_else(|| schema.all_of.first());
        match branch.and_then(SchemaNode::as_schema) {
            Some(branch) => self.value(rng, root, branch, depth),
            None => Ok(Value::String(free_text(rng))),
        }
    }

    /// Draws an object, or the placeholder object at the depth limit.
    fn object_value(
        &self,
        rng: &mut StdRng,
        root: &InputSchema,
        schema: &InputSchema,
        depth: usize,
    ) -> Result<Value, ConnectorError> {
        let mut object = Map::new();
        if depth >= self.max_depth {
            object.insert("key".to_string(), Value::String(PLACEHOLDER.to_string()));
            return Ok(Value::Object(object));
        }
        for (name, node) in &schema.properties {
            let value = match node {
                SchemaNode::Bool(false) => continue,
                SchemaNode::Bool(true) => Value::String(word(rng).to_string()),
                SchemaNode::Schema(property) => self.value(rng, root, property, depth + 1)?,
            };
            object.insert(name.clone(), value);
        }
        Ok(Value::Object(object))
    }

    /// Draws an array honoring length bounds and `uniqueItems`.
    fn array_value(
        &self,
        rng: &mut StdRng,
        root: &InputSchema,
        schema: &InputSchema,
        depth: usize,
    ) -> Result<Value, ConnectorError> {
        let mut max_items = schema.max_items.unwrap_or_else(|| {
            DEFAULT_MAX_ITEMS.max(schema.min_items.unwrap_or(DEFAULT_MIN_ITEMS))
        });
        let min_items = schema.min_items.unwrap_or_else(|| DEFAULT_MIN_ITEMS.min(max_items));
        if max_items < min_items {
            max_items = min_items;
        }
        let unique = schema.unique_items == Some(true);
        let item_schema = match &schema.items {
            Some(SchemaNode::Bool(false)) => return Ok(Value::Array(Vec::new())),
            Some(SchemaNode::Schema(items)) if depth < self.max_depth => {
                Some(resolve(root, items)?)
            }
            _ => None,
        };
        let unique_choices = if unique {
            item_schema.and_then(|items| items.enum_values.as_deref()).map(distinct_values)
        } else {
            None
        };
        if let Some(choices) = &unique_choices {
            let available = u64::try_from(choices.len()).unwrap_or(u64::MAX);
            if min_items > available {
                return Err(ConnectorError::UniqueConstraint(format!(
                    "minItems {min_items} exceeds the {available} distinct enum values"
                )));
            }
            max_items = max_items.min(available);
        }
        let count = rng.gen_range(min_items ..= max_items);
        let count = usize::try_from(count).map_err(|_| {
            ConnectorError::InvalidSchema(format!("array length {count} is not addressable"))
        })?;
        if let Some(choices) = unique_choices {
            return Ok(Value::Array(choices.choose_multiple(rng, count).cloned().collect()));
        }
        let mut items = Vec::with_capacity(count);
        let mut seen = BTreeSet::new();
        for _ in 0 .. count {
            let mut drawn = None;
            let attempts = if unique { UNIQUE_ATTEMPTS } else { 1 };
            for _ in 0 .. attempts {
                let candidate = match item_schema {
                    Some(items) => self.value(rng, root, items, depth + 1)?,
                    None => Value::String(PLACEHOLDER.to_string()),
                };
                if !unique || seen.insert(candidate.to_string()) {
                    drawn = Some(candidate);
                    break;
                }
            }
            let Some(item) = drawn else {
                return Err(ConnectorError::UniqueValue(format!(
                    "no unique array element after {UNIQUE_ATTEMPTS} attempts"
                )));
            };
            items.push(item);
        }
        Ok(Value::Array(items))
    }
}

// ============================================================================
// SECTION: Special Fields
// ============================================================================

/// Generates an id for `id_field`: monotonic nanoseconds for integer ids,
/// otherwise a fresh UUID.
#[must_use]
pub fn generate_id(schema: &InputSchema, id_field: &str) -> Value {
    match schema.property(id_field).and_then(InputSchema::primary_type) {
        Some("integer") => Value::from(monotonic_nanos()),
        _ => Value::String(Uuid::new_v4().to_string()),
    }
}

/// Generates the current time for `updated_field`: RFC3339 for string
/// fields, otherwise Unix seconds.
///
/// # Errors
///
/// Returns [`ConnectorError::Serialization`] when the clock cannot be formatted.
pub fn generate_timestamp(
    schema: &InputSchema,
    updated_field: &str,
) -> Result<Value, ConnectorError> {
    let now = Timestamp::now();
    match schema.property(updated_field).and_then(InputSchema::primary_type) {
        Some("string") => Ok(Value::String(now.to_rfc3339()?)),
        _ => Ok(Value::from(now.unix_seconds())),
    }
}

// ============================================================================
// SECTION: Schema Helpers
// ============================================================================

/// Follows `$ref` links from `schema` within the root document.
pub(crate) fn resolve<'a>(
    root: &'a InputSchema,
    schema: &'a InputSchema,
) -> Result<&'a InputSchema, ConnectorError> {
    let mut current = schema;
    for _ in 0 .. MAX_REF_HOPS {
        let Some(reference) = current.reference.as_deref() else {
            return Ok(current);
        };
        current = lookup_ref(root, reference)?;
    }
    Err(ConnectorError::InvalidSchema(format!(
        "reference chain exceeds {MAX_REF_HOPS} hops"
    )))
}

/// Resolves one local reference.
fn lookup_ref<'a>(
    root: &'a InputSchema,
    reference: &str,
) -> Result<&'a InputSchema, ConnectorError> {
    if reference == "#" {
        return Ok(root);
    }
    let name = reference
        .strip_prefix("#/$defs/")
        .ok_or_else(|| {
            ConnectorError::InvalidSchema(format!("unsupported reference {reference}"))
        })?;
    root.defs
        .get(name)
        .and_then(SchemaNode::as_schema)
        .ok_or_else(|| ConnectorError::InvalidSchema(format!("unresolved reference {reference}")))
}

/// Drops enum values whose JSON text repeats an earlier value.
fn distinct_values(values: &[Value]) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    values.iter().filter(|value| seen.insert(value.to_string())).cloned().collect()
}

/// Picks the generation type of a schema.
fn infer_type(schema: &InputSchema) -> &str {
    if let Some(kind) = schema.primary_type() {
        return kind;
    }
    if !schema.properties.is_empty() {
        "object"
    } else if schema.items.is_some() {
        "array"
    } else if schema.any_of.is_empty() && schema.one_of.is_empty() && schema.all_of.is_empty() {
        "string"
    } else {
        "composed"
    }
}

/// Converts an optional schema length to `usize`.
fn length_bound(value: Option<u64>) -> Option<usize> {
    value.map(|length| usize::try_from(length).unwrap_or(usize::MAX))
}

// ============================================================================
// SECTION: Strings
// ============================================================================

/// Draws a string honoring `pattern`, `format`, and length bounds.
fn string_value(rng: &mut StdRng, schema: &InputSchema) -> String {
    let min_length = length_bound(schema.min_length).unwrap_or(0);
    let max_length = length_bound(schema.max_length);
    if let Some(pattern) = &schema.pattern
        && let Some(matched) = pattern_value(rng, pattern, min_length, max_length)
    {
        return matched;
    }
    let text = schema
        .format
        .as_deref()
        .and_then(|format| format_value(rng, format))
        .unwrap_or_else(|| free_text(rng));
    fit_length(rng, text, min_length, max_length)
}

/// Draws a regex match within the length bounds, if one turns up quickly.
fn pattern_value(
    rng: &mut StdRng,
    pattern: &str,
    min_length: usize,
    max_length: Option<usize>,
) -> Option<String> {
    let matcher = regex::Regex::new(pattern).ok()?;
    let generator = match rand_regex::Regex::compile(strip_anchors(pattern), MAX_PATTERN_REPEAT) {
        Ok(generator) => generator,
        Err(err) => {
            debug!(pattern, error = %err, "pattern cannot drive generation");
            return None;
        }
    };
    (0 .. PATTERN_ATTEMPTS).find_map(|_| {
        let candidate: String = rng.sample(&generator);
        let length = candidate.chars().count();
        let fits = length >= min_length && max_length.is_none_or(|max| length <= max);
        (fits && matcher.is_match(&candidate)).then_some(candidate)
    })
}

/// Removes a leading `^` and a trailing unescaped `$`.
pub(crate) fn strip_anchors(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
    match pattern.strip_suffix('$') {
        Some(body) if !body.ends_with('\\') => body,
        _ => pattern,
    }
}

/// Draws a string for a well-known `format`.
fn format_value(rng: &mut StdRng, format: &str) -> Option<String> {
    let text = match format {
        "email" => format!("{}.{}@example.com", pick(rng, FIRST_NAMES).to_lowercase(), word(rng)),
        "date-time" => random_instant(rng).to_rfc3339().ok()?,
        "date" => {
            let seconds = random_instant(rng).unix_seconds();
            let date = OffsetDateTime::from_unix_timestamp(seconds).ok()?;
            format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
        }
        "time" => format!(
            "{:02}:{:02}:{:02}Z",
            rng.gen_range(0 .. 24),
            rng.gen_range(0 .. 60),
            rng.gen_range(0 .. 60)
        ),
        "uuid" => {
            let mut bytes = [0_u8; 16];
            rng.fill_bytes(&mut bytes);
            uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
        }
        "uri" | "url" | "iri" => format!("https://{}.example.com/{}", word(rng), word(rng)),
        "hostname" | "idn-hostname" => format!("{}.example.com", word(rng)),
        "phone" => {
            format!("+1-555-{:03}-{:04}", rng.gen_range(0 .. 1000), rng.gen_range(0 .. 10_000))
        }
        "ipv4" => format!(
            "{}.{}.{}.{}",
            rng.gen_range(1 ..= 223),
            rng.gen_range(0 ..= 255),
            rng.gen_range(0 ..= 255),
            rng.gen_range(1 ..= 254)
        ),
        "ipv6" => (0 .. 8)
            .map(|_| format!("{:x}", rng.gen_range(0 ..= 0xffff_u32)))
            .collect::<Vec<_>>()
            .join(":"),
        "color" => format!("#{:06x}", rng.gen_range(0 ..= 0x00ff_ffff_u32)),
        "country" => pick(rng, COUNTRIES).to_string(),
        "city" => pick(rng, CITIES).to_string(),
        "street-address" => format!(
            "{} {} {}",
            rng.gen_range(1 .. 2000),
            capitalize(word(rng)),
            pick(rng, STREET_SUFFIXES)
        ),
        "postal-code" => format!("{:05}", rng.gen_range(0 .. 100_000)),
        _ => return None,
    };
    Some(text)
}

/// Draws a name, a word, or a sentence.
fn free_text(rng: &mut StdRng) -> String {
    match rng.gen_range(0 .. 3) {
        0 => format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)),
        1 => word(rng).to_string(),
        _ => {
            let count = rng.gen_range(3 ..= 8);
            let words: Vec<&str> = (0 .. count).map(|_| word(rng)).collect();
            format!("{}.", capitalize(&words.join(" ")))
        }
    }
}

/// Pads with random letters or truncates to fit the length bounds.
pub(crate) fn fit_length(
    rng: &mut StdRng,
    mut text: String,
    min_length: usize,
    max_length: Option<usize>,
) -> String {
    let mut length = text.chars().count();
    while length < min_length {
        text.push(char::from(*pick(rng, PAD_LETTERS)));
        length += 1;
    }
    match max_length {
        Some(max) if length > max => text.chars().take(max).collect(),
        _ => text,
    }
}

/// Draws a random instant within the last few years.
fn random_instant(rng: &mut StdRng) -> Timestamp {
    let now = Timestamp::now().unix_seconds();
    Timestamp::from_unix_seconds(now.saturating_sub(rng.gen_range(0 ..= DATE_SPAN_SECONDS)))
}

/// Picks one entry of a non-empty list.
fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0 .. items.len())]
}

/// Picks one word.
fn word(rng: &mut StdRng) -> &'static str {
    *pick(rng, WORDS)
}

/// Upper-cases the first character.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

// ============================================================================
// SECTION: Numbers
// ============================================================================

/// Reads a schema number as `f64`.
fn as_f64(number: &Number) -> Option<f64> {
    number.as_f64()
}

/// Converts an integral `f64` to `i64`, saturating at the range ends.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Input is integral and clamped to the i64 range before the cast."
)]
fn saturating_i64(value: f64) -> i64 {
    if value.is_nan() {
        0
    } else if value >= 9.223_372_036_854_775e18 {
        i64::MAX
    } else if value <= -9.223_372_036_854_775e18 {
        i64::MIN
    } else {
        value as i64
    }
}

/// Reads a schema number as an integer bound, rounding toward the interior.
fn integer_bound(number: &Number, lower: bool) -> Option<i64> {
    number.as_i64().or_else(|| {
        as_f64(number).map(|value| saturating_i64(if lower { value.ceil() } else { value.floor() }))
    })
}

/// Draws an integer honoring bounds, exclusive bounds, and `multipleOf`.
fn integer_value(rng: &mut StdRng, schema: &InputSchema) -> Result<i64, ConnectorError> {
    let mut lower = schema.minimum.as_ref().and_then(|number| integer_bound(number, true));
    let mut upper = schema.maximum.as_ref().and_then(|number| integer_bound(number, false));
    match &schema.exclusive_minimum {
        Some(ExclusiveBound::Flag(true)) => lower = lower.map(|value| value.saturating_add(1)),
        Some(ExclusiveBound::Value(bound)) => {
            let exclusive =
                as_f64(bound).map(|value| saturating_i64(value.floor()).saturating_add(1));
            lower = lower.max(exclusive);
        }
        _ => {}
    }
    match &schema.exclusive_maximum {
        Some(ExclusiveBound::Flag(true)) => upper = upper.map(|value| value.saturating_sub(1)),
        Some(ExclusiveBound::Value(bound)) => {
            let exclusive =
                as_f64(bound).map(|value| saturating_i64(value.ceil()).saturating_sub(1));
            upper = match (upper, exclusive) {
                (Some(current), Some(exclusive)) => Some(current.min(exclusive)),
                (current, exclusive) => current.or(exclusive),
            };
        }
        _ => {}
    }
    let (lower, upper) = match (lower, upper) {
        (Some(lower), Some(upper)) => (lower, upper),
        (Some(lower), None) => (lower, DEFAULT_BOUND.max(lower.saturating_add(DEFAULT_BOUND))),
        (None, Some(upper)) => ((-DEFAULT_BOUND).min(upper.saturating_sub(DEFAULT_BOUND)), upper),
        (None, None) => (-DEFAULT_BOUND, DEFAULT_BOUND),
    };
    if lower > upper {
        return Err(ConnectorError::InvalidSchema(format!(
            "integer range [{lower}, {upper}] is empty"
        )));
    }
    let step = schema.multiple_of.as_ref().and_then(|number| {
        number
            .as_i64()
            .or_else(|| as_f64(number).filter(|value| value.fract() == 0.0).map(saturating_i64))
    });
    match step {
        Some(step) if step > 0 => {
            let first = ceil_div(lower, step);
            let last = upper.div_euclid(step);
            if first > last {
                return Err(ConnectorError::InvalidSchema(format!(
                    "no multiple of {step} in [{lower}, {upper}]"
                )));
            }
            Ok(rng.gen_range(first ..= last).saturating_mul(step))
        }
        _ => Ok(rng.gen_range(lower ..= upper)),
    }
}

/// Integer division rounding toward positive infinity.
pub(crate) const fn ceil_div(value: i64, step: i64) -> i64 {
    let floor = value.div_euclid(step);
    if value.rem_euclid(step) == 0 { floor } else { floor.saturating_add(1) }
}

/// Draws a number honoring bounds, exclusive bounds, and `multipleOf`.
#[allow(clippy::cast_precision_loss, reason = "Default bounds are small integers.")]
fn number_value(rng: &mut StdRng, schema: &InputSchema) -> Result<Value, ConnectorError> {
    let default = DEFAULT_BOUND as f64;
    let mut lower = schema.minimum.as_ref().and_then(as_f64);
    let mut upper = schema.maximum.as_ref().and_then(as_f64);
    match &schema.exclusive_minimum {
        Some(ExclusiveBound::Flag(true)) => lower = lower.map(|value| value + NUMBER_EPSILON),
        Some(ExclusiveBound::Value(bound)) => {
            if let Some(bound) = as_f64(bound) {
                let bound = bound + NUMBER_EPSILON;
                lower = Some(lower.map_or(bound, |value| value.max(bound)));
            }
        }
        _ => {}
    }
    match &schema.exclusive_maximum {
        Some(ExclusiveBound::Flag(true)) => upper = upper.map(|value| value - NUMBER_EPSILON),
        Some(ExclusiveBound::Value(bound)) => {
            if let Some(bound) = as_f64(bound) {
                let bound = bound - NUMBER_EPSILON;
                upper = Some(upper.map_or(bound, |value| value.min(bound)));
            }
        }
        _ => {}
    }
    let (lower, upper) = match (lower, upper) {
        (Some(lower), Some(upper)) => (lower, upper),
        (Some(lower), None) => (lower, default.max(lower + default)),
        (None, Some(upper)) => ((-default).min(upper - default), upper),
        (None, None) => (-default, default),
    };
    if lower.is_nan() || upper.is_nan() || lower > upper {
        return Err(ConnectorError::InvalidSchema(format!(
            "number range [{lower}, {upper}] is empty"
        )));
    }
    let mut value = if lower < upper { rng.gen_range(lower ..= upper) } else { lower };
    if let Some(step) = schema.multiple_of.as_ref().and_then(as_f64).filter(|step| *step > 0.0) {
        value = (value / step).floor() * step;
        if value < lower {
            value += step;
        }
    }
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| ConnectorError::InvalidSchema(format!("number {value} is not finite")))
}
