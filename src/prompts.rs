//! Prompt templates.
//!
//! The wording is content, not logic: callers only rely on each function
//! returning a non-empty prompt bound to its arguments.

use crate::indicators::Indicator;

pub fn indicator_search_system(indicator: &Indicator, city: &str) -> String {
    format!(
        "You are a research assistant gathering the most recent official statistics, \
         reports or reputable news coverage on \"{}\" for the city of {}.",
        indicator.name, city
    )
}

pub fn indicator_search_user(indicator: &Indicator, city: &str) -> String {
    let mut hints = String::new();
    if let Some(ref s) = indicator.sources.city_level {
        hints.push_str(&format!("\n- City level source: {}", s));
    }
    if let Some(ref s) = indicator.sources.national {
        hints.push_str(&format!("\n- National source: {}", s));
    }

    format!(
        r####"Objective: find the current value of the indicator below for the given city and rate its maturity on a 1 to 5 scale.
Indicator: {name}
City: {city}
Maturity thresholds: {scale}
Suggested sources:{hints}

Instructions:
1. Search official and reputable sources: the city data portal, government sites, statistical agencies, research bodies, trusted news.
2. Make sure the figure is about {city} and not a place with a similar name. Prefer the most recent credible figure; data up to 10 years old is acceptable when nothing newer exists.
3. Extract the core number for the indicator.
4. Cite sources inline as [1], [2] and list the full URLs at the end under "### Sources".
5. Map the value onto the thresholds and assign the maturity level.
6. Answer in this shape:
- Indicator: <name>
- Data Found: <value>
- Maturity Level: <1-5>

If no credible data exists after a thorough search, say so and report Maturity Level: 0."####,
        name = indicator.name,
        city = city,
        scale = if indicator.maturity_scale.is_empty() { "not provided" } else { indicator.maturity_scale.as_str() },
        hints = if hints.is_empty() { " none".to_string() } else { hints },
    )
}

pub const EXTRACTION_INSTRUCTION: &str = r#"You read a research answer about one city indicator and return it in a fixed format.
- indicator_value: the numeric value found for the indicator. "Data Found: 47 datasets" gives 47.
- maturity_score: the integer maturity level assigned to that value. "Maturity Level: 4" gives 4.
If the labels are absent, infer the values from context. If several values appear, use the one tied to the final result.
If the answer reports that no data was found, return 0 for both fields."#;

pub fn extraction_request(raw_text: &str) -> String {
    format!("Extract the indicator value and maturity score from this output:\n{}", raw_text)
}

pub fn extraction_recheck(raw_text: &str, indicator_value: f64, maturity_score: u8) -> String {
    format!(
        r#"Check whether the indicator value (between ###) and maturity score (between $$$) were extracted correctly from the search response (between @@@). If they were, return them unchanged. If not, extract them again from the search response.

Search Response: @@@ {} @@@

Indicator Value: ### {} ###
Maturity Score: $$$ {} $$$"#,
        raw_text, indicator_value, maturity_score
    )
}

pub fn category_indicators(category: &str) -> String {
    format!(
        r#"You are a smart city assessment expert. List at least 20 distinct, measurable indicators for the category "{category}".
Each indicator must be quantifiable, carry a unit, and apply to cities of any size.
Follow each indicator with a 5-level maturity scale (1 basic, 2 developing, 3 established, 4 advanced, 5 leading) using numeric ranges.

Format:
1. <Indicator> (<unit>)
   Maturity levels: 1: <range>, 2: <range>, 3: <range>, 4: <range>, 5: <range>"#,
        category = category
    )
}

pub fn category_indicators_extraction(listing: &str) -> String {
    format!(
        "Extract the list of indicators and the list of their maturity scales, in the same order, from this output:\n{}",
        listing
    )
}

pub fn single_indicator(category: &str) -> String {
    format!(
        "You are a smart city assessment expert. Give one measurable indicator with its unit for the \
         category \"{}\", and its 5-level maturity scale written as \"1: <range>, 2: <range>, 3: <range>, \
         4: <range>, 5: <range>\".",
        category
    )
}

pub fn maturity_format(scale: &str) -> String {
    format!(
        "Rewrite this maturity scale with one level per line, keeping the thresholds exactly.\n\
         Input: {}\n\n\
         Example input: 1: <10, 2: 10-25, 3: 26-40, 4: 41-55, 5: >55\n\
         Example output:\nLevel 1: <10\nLevel 2: 10-25\nLevel 3: 26-40\nLevel 4: 41-55\nLevel 5: >55",
        scale
    )
}

pub fn stakeholders(city: &str, country: &str) -> String {
    format!(
        r#"List the key stakeholders and institutions involved in urban development, employment and economic growth policy for {city}, {country}.
Cover national ministries (urban development and housing, economic planning, local administration, labor, industry and trade), regional bodies, city authorities and planning agencies, industry associations and chambers of commerce, development authorities, regulators, public-private partnership entities, and civil society.
For each entry give:
[Institution Name]:
Role: <responsibilities and influence on planning, jobs, growth, infrastructure, governance>
Key Interlocutors: <names and titles where known>
Refer to real institutions in {country} wherever possible."#,
        city = city,
        country = country
    )
}

pub fn table_of_contents(
    city: &str,
    country: &str,
    policy_levers: &[String],
    stakeholders: &str,
    report_structure: &str,
    max_queries: usize,
) -> String {
    format!(
        r#"You are a research assistant preparing a structured literature review on jobs and growth in {city}, {country}.

Framework: People (human capital, labor markets, skills), Production (industry structure, productivity, value chains), Places (infrastructure, spatial dynamics, livability).
Cross-cutting themes: gender equality, climate change, digital transformation, governance and institutions.
Local stakeholders: {stakeholders}
Policy levers to consider: {levers}

Produce a hierarchical table of contents in markdown (numbered sections and subsections) covering introduction, conceptual framework, urban context, the three framework pillars, cross-cutting themes, policy levers and recommendations.
For every subsection list {max_queries} targeted search queries mixing academic and policy literature, city-specific and comparative regional evidence.
Take these structure requests from the user into account: {structure}"#,
        city = city,
        country = country,
        stakeholders = if stakeholders.trim().is_empty() { "not provided" } else { stakeholders },
        levers = policy_levers.join(", "),
        max_queries = max_queries,
        structure = if report_structure.trim().is_empty() { "none" } else { report_structure },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_prompts_bind_indicator_and_city() {
        let ind = Indicator::new("Broadband penetration", "Connectivity", "1: <10, 5: >55");
        let sys = indicator_search_system(&ind, "Springfield");
        let user = indicator_search_user(&ind, "Springfield");

        assert!(sys.contains("Broadband penetration") && sys.contains("Springfield"));
        assert!(user.contains("Maturity thresholds: 1: <10, 5: >55"));
        assert!(user.contains("Suggested sources: none"));
        assert!(user.contains("under \"### Sources\"."));
        assert!(user.ends_with("report Maturity Level: 0."));
    }

    #[test]
    fn test_recheck_embeds_first_pass() {
        let p = extraction_recheck("raw answer", 12.5, 0);
        assert!(p.contains("@@@ raw answer @@@"));
        assert!(p.contains("### 12.5 ###"));
        assert!(p.contains("$$$ 0 $$$"));
    }

    #[test]
    fn test_toc_prompt_lists_levers() {
        let levers = vec!["Apprenticeship programs".to_string(), "Public Wi-Fi systems".to_string()];
        let p = table_of_contents("Sadat City", "Egypt", &levers, "", "Focus on SMEs", 5);
        assert!(p.contains("Apprenticeship programs, Public Wi-Fi systems"));
        assert!(p.contains("Local stakeholders: not provided"));
        assert!(p.contains("Focus on SMEs"));
    }
}
