//! Deterministic pattern pass over a hit's title and snippet.
//!
//! Always runs and never fails. Fields it cannot find stay empty; the AI pass
//! and the merge decide what wins.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

// =============================================================================
// Patterns
// =============================================================================

static RE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(?:US|C|A)?[$€£]|\b(?:USD|EUR|GBP)\s?)\s?\d+(?:[.,]\d+)*\s?(?:million|billion|mn|bn|m|b|k)?\b",
    )
    .unwrap()
});
static RE_AMOUNT_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:million|billion)\b").unwrap());
static RE_ROUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(pre-seed|pre\s+seed|seed|angel|series\s+[a-h]\+?|bridge)\b").unwrap()
});
static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}\b|\b\d{4}-\d{2}-\d{2}\b|\b\d{1,2}/\d{1,2}/\d{4}\b",
    )
    .unwrap()
});
static RE_LED_BY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:co-led\s+by|led\s+by)\s+([A-Z][^.;:()\n]*?)(?:\s+(?i:with|to|for|which|who|that|as|at|bringing|alongside)\b|[.;:()\n]|$)",
    )
    .unwrap()
});
static RE_PARTICIPATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:participation\s+from|participation\s+of|alongside)\s+([A-Z][^.;:()\n]*?)(?:\s+(?i:to|for|which|who|that|as|at|bringing)\b|[.;:()\n]|$)",
    )
    .unwrap()
});
static RE_FROM_WITH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:backed\s+by|from|with)\s+([A-Z][^.;:()\n]*?)(?:\s+(?i:to|for|which|who|that|as|at|bringing|in)\b|[.;:()\n]|$)",
    )
    .unwrap()
});
static RE_BASED_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:based\s+in|headquartered\s+in)\s+([A-Z][\w'-]*(?:(?:\s+|,\s*)[A-Z][\w'-]*)*)",
    )
    .unwrap()
});
static RE_DASH_BASED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)-based\b").unwrap());
static RE_FROM_PLACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:from)\s+([A-Z][\w'-]*(?:(?:\s+|,\s*)[A-Z][\w'-]*)*)").unwrap()
});
static RE_WEBSITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:https?://)?(?:www\.)?((?:[a-z0-9-]+\.)+(?:com|io|ai|co|net|org|app|dev|tech|xyz|so))\b",
    )
    .unwrap()
});
static RE_TITLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.+?)\s+(?i:raises|raised|secures|secured|lands|landed|closes|closed|bags|nabs|gets|snags|announces|completes|receives|scores)\b",
    )
    .unwrap()
});
static RE_BASED_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\S+-based\s+)+").unwrap());

/// Last words that mark a name after "from"/"with" as an investor.
const INVESTOR_SUFFIXES: &[&str] = &[
    "ventures",
    "capital",
    "partners",
    "fund",
    "funds",
    "investments",
    "holdings",
    "equity",
    "angels",
    "vc",
];

/// Industry vocabulary: tag and the phrases that signal it.
const INDUSTRY_VOCABULARY: &[(&str, &[&str])] = &[
    ("AI", &["ai", "artificial intelligence", "generative ai", "genai", "llm", "llms"]),
    ("Machine Learning", &["machine learning", "ml", "deep learning"]),
    ("SaaS", &["saas", "software-as-a-service", "b2b software"]),
    ("FinTech", &["fintech", "payments", "banking", "lending", "insurtech"]),
    ("HealthTech", &["healthtech", "digital health", "healthcare", "telehealth", "medtech"]),
    ("Biotech", &["biotech", "biotechnology", "drug discovery", "therapeutics"]),
    ("Climate Tech", &["climate", "climate tech", "clean energy", "carbon", "solar", "battery"]),
    ("Crypto", &["crypto", "blockchain", "web3", "defi"]),
    ("E-commerce", &["e-commerce", "ecommerce", "online retail", "d2c"]),
    ("EdTech", &["edtech", "education technology", "online learning"]),
    ("Cybersecurity", &["cybersecurity", "security platform", "threat detection"]),
    ("Robotics", &["robotics", "robots", "autonomous"]),
    ("Developer Tools", &["developer tools", "devtools", "developer platform"]),
    ("Marketplace", &["marketplace"]),
    ("Mobility", &["mobility", "electric vehicle", "electric vehicles", "ev charging"]),
];

static INDUSTRY_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    INDUSTRY_VOCABULARY
        .iter()
        .map(|(tag, phrases)| {
            let alternation = phrases
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            (*tag, Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap())
        })
        .collect()
});

// =============================================================================
// Result
// =============================================================================

/// Everything the pattern pass could find.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternExtraction {
    pub project_name: Option<String>,
    pub funding_amount: Option<String>,
    pub funding_round: Option<String>,
    pub funding_date: Option<String>,
    pub investors: Vec<String>,
    pub location: Option<String>,
    pub industry_tags: Vec<String>,
    pub website: Option<String>,
}

/// Run every pattern over `title` and `snippet`.
///
/// `source_url` is used to keep the publication's own domain out of the
/// website field.
pub fn extract_patterns(title: &str, snippet: &str, source_url: &str) -> PatternExtraction {
    let text = format!("{title}. {snippet}");
    let investors = extract_investors(&text);
    let location = extract_location(&text, &investors);

    PatternExtraction {
        project_name: name_from_title(title),
        funding_amount: extract_amount(&text),
        funding_round: extract_round(&text),
        funding_date: RE_DATE.find(&text).map(|m| m.as_str().to_string()),
        investors,
        location,
        industry_tags: extract_industry_tags(&text),
        website: extract_website(&text, source_url),
    }
}

pub fn extract_amount(text: &str) -> Option<String> {
    RE_AMOUNT
        .find(text)
        .or_else(|| RE_AMOUNT_WORDS.find(text))
        .map(|m| m.as_str().trim().to_string())
}

/// Funding round, normalized to lowercase (`"seed"`, `"series a"`, `"pre-seed"`).
pub fn extract_round(text: &str) -> Option<String> {
    let raw = RE_ROUND.captures(text)?.get(1)?.as_str().to_lowercase();
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(if normalized == "pre seed" {
        "pre-seed".to_string()
    } else {
        normalized
    })
}

/// Investors named after "led by", "participation from", or as a fallback
/// "from"/"with"/"backed by".
///
/// The fallback only keeps names that end in an investor word ("Omega
/// Ventures"), so "a startup from Germany" is left to the location pass.
pub fn extract_investors(text: &str) -> Vec<String> {
    let mut investors = Vec::new();
    let mut seen = HashSet::new();

    collect_names(&RE_LED_BY, text, &mut investors, &mut seen, |_| true);
    collect_names(&RE_PARTICIPATION, text, &mut investors, &mut seen, |_| true);
    if investors.is_empty() {
        collect_names(&RE_FROM_WITH, text, &mut investors, &mut seen, looks_like_investor);
    }

    investors
}

fn collect_names(
    re: &Regex,
    text: &str,
    out: &mut Vec<String>,
    seen: &mut HashSet<String>,
    accept: fn(&str) -> bool,
) {
    for cap in re.captures_iter(text) {
        for name in split_names(&cap[1]) {
            if accept(&name) && seen.insert(name.to_lowercase()) {
                out.push(name);
            }
        }
    }
}

fn looks_like_investor(name: &str) -> bool {
    name.split_whitespace()
        .last()
        .map(|word| INVESTOR_SUFFIXES.contains(&word.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .flat_map(|part| part.split(" and "))
        .map(|name| {
            name.trim()
                .trim_start_matches("and ")
                .trim_start_matches("existing investors ")
                .trim()
                .to_string()
        })
        .filter(|name| name.len() >= 2 && name.starts_with(|c: char| c.is_uppercase()))
        .collect()
}

/// Location after "based in"/"headquartered in", an "X-based" prefix, or
/// "from X" when X is not one of the investors.
pub fn extract_location(text: &str, investors: &[String]) -> Option<String> {
    let clean = |s: &str| s.trim().trim_end_matches([',', '.']).trim().to_string();

    if let Some(cap) = RE_BASED_IN.captures(text) {
        return Some(clean(&cap[1]));
    }
    if let Some(cap) = RE_DASH_BASED.captures(text) {
        return Some(clean(&cap[1]));
    }

    RE_FROM_PLACE
        .captures_iter(text)
        .map(|cap| clean(&cap[1]))
        .find(|place| {
            !place.is_empty()
                && !investors
                    .iter()
                    .any(|inv| inv.eq_ignore_ascii_case(place) || place.contains(inv.as_str()))
        })
}

pub fn extract_industry_tags(text: &str) -> Vec<String> {
    INDUSTRY_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(tag, _)| tag.to_string())
        .collect()
}

/// First domain in the text that isn't the source's own.
pub fn extract_website(text: &str, source_url: &str) -> Option<String> {
    let source_host = host_of(source_url);

    RE_WEBSITE
        .captures_iter(text)
        .map(|cap| cap[1].to_lowercase())
        .find(|host| {
            source_host
                .as_deref()
                .map(|src| !same_site(host, src))
                .unwrap_or(true)
        })
        .map(|host| format!("https://{host}"))
}

/// Text before the funding verb in a headline ("Acme raises $5M" -> "Acme").
pub fn name_from_title(title: &str) -> Option<String> {
    let cap = RE_TITLE_NAME.captures(title.trim())?;
    let mut name = cap[1].trim();

    if let Some(idx) = name.rfind(": ") {
        name = &name[idx + 2..];
    }
    let name = RE_BASED_PREFIX.replace(name, "");
    let name = name
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '“' || c == '”')
        .trim_end_matches("'s")
        .trim();

    (!name.is_empty()).then(|| name.to_string())
}

/// Fallback name: the headline's first segment.
pub fn name_from_title_segment(title: &str) -> String {
    let segment = title
        .split(['|', '–', '—'])
        .next()
        .unwrap_or(title)
        .split(" - ")
        .next()
        .unwrap_or(title)
        .trim();
    segment.chars().take(80).collect::<String>().trim().to_string()
}

/// Lowercased host without a leading `www.`.
pub fn host_of(url: &str) -> Option<String> {
    let with_scheme = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    let parsed = url::Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.trim_start_matches("www.").to_string())
}

/// Same host, or one is a subdomain of the other.
pub fn same_site(a: &str, b: &str) -> bool {
    let a = a.trim_start_matches("www.");
    let b = b.trim_start_matches("www.");
    a == b || a.ends_with(&format!(".{b}")) || b.ends_with(&format!(".{a}"))
}
