//! Scoring dimensions.
//!
//! A dimension is one scoring axis. Trust and growth share every step of
//! the pipeline; only the wording of their prompts differs, so they are
//! plain data rows rather than separate code paths.

use crate::config::ChunkingConfig;

/// Definition of one scoring axis.
#[derive(Debug, Clone)]
pub struct Dimension {
    /// Machine name used in logs (`trust`, `growth`).
    pub name: &'static str,
    /// Display label (`Trust`, `Growth`).
    pub label: &'static str,
    /// Quality being rated (`Transparency`, `Differentiation`).
    pub quality: &'static str,
    /// What kind of text is being scored.
    pub source_kind: &'static str,
    /// The question asked for every chunk.
    pub question: &'static str,
    /// Persona used for the summary call.
    pub consultant: &'static str,
    /// What the score was based on, for the summary prompt.
    pub evidence: &'static str,
    /// What the recommendations should target.
    pub recommendation_focus: &'static str,
    /// Maximum characters per chunk.
    pub max_chunk_chars: usize,
    /// Maximum justifications passed to the summary call.
    pub max_summary_justifications: usize,
}

impl Dimension {
    /// Transparency of annual reports.
    pub fn trust(chunking: &ChunkingConfig) -> Self {
        Self {
            name: "trust",
            label: "Trust",
            quality: "Transparency",
            source_kind: "annual report excerpt",
            question: "how openly does the company discuss its challenges and risks?",
            consultant: "an expert business consultant",
            evidence: "its annual report excerpts",
            recommendation_focus: "improving transparency in communications, investor relations, \
                or marketing (e.g., what topics or data to disclose more openly)",
            max_chunk_chars: chunking.max_chunk_chars,
            max_summary_justifications: chunking.max_summary_justifications,
        }
    }

    /// Differentiation of public communications.
    pub fn growth(chunking: &ChunkingConfig) -> Self {
        Self {
            name: "growth",
            label: "Growth",
            quality: "Differentiation",
            source_kind: "communications excerpt",
            question: "how clear and strong is its unique value proposition?",
            consultant: "an expert marketing and strategy consultant",
            evidence: "its communications and web content",
            recommendation_focus: "strengthening differentiation and marketing positioning \
                (e.g., messaging focus, channels, partnerships)",
            max_chunk_chars: chunking.max_chunk_chars,
            max_summary_justifications: chunking.max_summary_justifications,
        }
    }

    /// Prompt asking the model to score one chunk.
    pub fn scoring_prompt(&self, chunk: &str) -> String {
        format!(
            "You are evaluating a company's {kind} for {quality}.\n\
             On a scale from 0 to 100, {question}\n\
             Respond ONLY in JSON: {{ \"score\": <int 0-100>, \"justification\": \"<brief explanation>\" }}.\n\
             Excerpt:\n\"\"\"{chunk}\"\"\"\n",
            kind = self.source_kind,
            quality = self.quality,
            question = self.question,
            chunk = chunk,
        )
    }

    /// Prompt asking the model to summarize chunk observations.
    ///
    /// `observations` is the already-formatted bullet list including any
    /// omission note.
    pub fn summary_prompt(&self, score: u8, observations: &str) -> String {
        format!(
            "You are {consultant}. A company's {quality} ({label}) has been scored {score}/100 \
             based on analysis of {evidence}. Here are key observations from different sections:\n\
             {observations}\n\n\
             Based on these observations and the score, provide:\n\
             1. A concise overall justification paragraph explaining why the {label} score is at this level.\n\
             2. Specific actionable recommendations for {focus}.\n\
             Respond in JSON with shape:\n\
             {{\n  \"overallJustification\": \"<concise paragraph>\",\n  \"recommendations\": [\"<rec 1>\", \"<rec 2>\", ...]\n}}\n\
             Only respond with valid JSON.\n",
            consultant = self.consultant,
            quality = self.quality,
            label = self.label,
            score = score,
            evidence = self.evidence,
            observations = observations,
            focus = self.recommendation_focus,
        )
    }
}

/// The dimensions evaluated for every run, in report order.
pub fn standard_dimensions(chunking: &ChunkingConfig) -> [Dimension; 2] {
    [Dimension::trust(chunking), Dimension::growth(chunking)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_prompt_embeds_chunk() {
        let dim = Dimension::trust(&ChunkingConfig::default());
        let prompt = dim.scoring_prompt("Revenue fell 3%.");

        assert!(prompt.contains("for Transparency"));
        assert!(prompt.contains("challenges and risks"));
        assert!(prompt.contains("\"\"\"Revenue fell 3%.\"\"\""));
        assert!(prompt.contains("{ \"score\": <int 0-100>"));
    }

    #[test]
    fn test_summary_prompt_uses_framing() {
        let dim = Dimension::growth(&ChunkingConfig::default());
        let prompt = dim.summary_prompt(64, "- Chunk 1: clear niche");

        assert!(prompt.contains("Differentiation (Growth) has been scored 64/100"));
        assert!(prompt.contains("- Chunk 1: clear niche"));
        assert!(prompt.contains("marketing positioning"));
        assert!(prompt.contains("\"overallJustification\""));
    }

    #[test]
    fn test_dimensions_take_chunking_bounds() {
        let chunking = ChunkingConfig {
            max_chunk_chars: 1234,
            max_log_chunk_chars: 10,
            max_summary_justifications: 3,
        };
        let [trust, growth] = standard_dimensions(&chunking);
        assert_eq!(trust.name, "trust");
        assert_eq!(growth.name, "growth");
        assert_eq!(trust.max_chunk_chars, 1234);
        assert_eq!(growth.max_summary_justifications, 3);
    }
}
