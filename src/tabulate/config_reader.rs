use crate::tabulate::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    /// Where the JSON summary goes when `--out` is not given. Relative to the
    /// configuration file.
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
}

/// The `config` section of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub election: u32,
    #[serde(rename = "ballotType")]
    pub ballot_type: String,
    #[serde(rename = "tallyType")]
    pub tally_type: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OptionConfig {
    pub id: OptionId,
    pub text: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertiesConfig {
    #[serde(rename = "minScore")]
    pub min_score: Option<Score>,
    #[serde(rename = "maxScore")]
    pub max_score: Option<Score>,
    pub seats: Option<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionConfig {
    pub id: QuestionId,
    pub options: Vec<OptionConfig>,
    #[serde(default)]
    pub properties: PropertiesConfig,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    pub id: u32,
    #[serde(rename = "ballotType")]
    pub ballot_type: String,
    #[serde(rename = "tallyType")]
    pub tally_type: String,
    pub questions: Vec<QuestionConfig>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TabulateConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub election: ElectionConfig,
    #[serde(rename = "recordSources", default)]
    pub record_sources: Vec<FileSource>,
}

impl ElectionConfig {
    /// The election definition used by the library. Names of ballot and tally
    /// types are checked here, everything else by the library itself.
    pub fn to_election(&self) -> TabulateResult<Election> {
        let ballot_type = BallotType::from_name(&self.ballot_type).context(UnknownBallotTypeSnafu {
            name: self.ballot_type.clone(),
        })?;
        let tally_type = TallyType::from_name(&self.tally_type).context(UnknownTallyTypeSnafu {
            name: self.tally_type.clone(),
        })?;
        let questions = self
            .questions
            .iter()
            .map(|q| Question {
                id: q.id,
                options: q
                    .options
                    .iter()
                    .map(|o| PollOption {
                        id: o.id,
                        text: o.text.clone(),
                    })
                    .collect(),
                properties: QuestionProperties {
                    min_score: q.properties.min_score,
                    max_score: q.properties.max_score,
                    seats: q.properties.seats,
                },
            })
            .collect();
        Ok(Election {
            id: self.id,
            ballot_type,
            tally_type,
            questions,
        })
    }
}

pub fn read_config(path: &str) -> TabulateResult<TabulateConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: TabulateConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> TabulateResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
