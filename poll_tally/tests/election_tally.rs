use poll_tally::*;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn options(ids: &[OptionId]) -> Vec<PollOption> {
    ids.iter()
        .map(|id| PollOption {
            id: *id,
            text: format!("Option {}", id),
        })
        .collect()
}

fn election(ballot_type: BallotType, tally_type: TallyType, questions: Vec<Question>) -> Election {
    Election {
        id: 42,
        ballot_type,
        tally_type,
        questions,
    }
}

fn encode_all(election: &Election, ballots: &[DecodedBallot]) -> Vec<String> {
    let codec = BallotCodec::new(election).unwrap();
    ballots.iter().map(|b| codec.encode(b).unwrap()).collect()
}

fn plurality_rows(result: &ElectionResult, question_id: QuestionId) -> Vec<(OptionId, Score, u32)> {
    match &result.questions[&question_id] {
        QuestionResult::Plurality(r) => r
            .rows
            .iter()
            .map(|row| (row.option_id, row.total, row.rank))
            .collect(),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn records_of_one_election_have_the_same_length() {
    init_logs();
    let e = election(
        BallotType::RadioRange,
        TallyType::Plurality,
        vec![
            Question::new(1, options(&[1, 2, 3])).with_score_range(-100, 100),
            Question::new(2, options(&[4])).with_score_range(0, 9_999_999_999),
        ],
    );
    let codec = BallotCodec::new(&e).unwrap();
    let small = DecodedBallot::new()
        .with_question(1, &[(1, 0), (2, 0), (3, 0)])
        .with_question(2, &[(4, 0)]);
    let large = DecodedBallot::new()
        .with_question(1, &[(1, -100), (2, 100), (3, -7)])
        .with_question(2, &[(4, 9_999_999_999)]);
    let a = codec.encode(&small).unwrap();
    let b = codec.encode(&large).unwrap();
    assert_eq!(a.len(), b.len());
    assert_eq!(Some(a.len()), codec.record_len());
    assert_eq!(codec.decode(&a).unwrap(), small);
    assert_eq!(codec.decode(&b).unwrap(), large);
}

#[test]
fn choose_plurality_ranks() {
    init_logs();
    let e = election(
        BallotType::Choose,
        TallyType::Plurality,
        vec![Question::new(1, options(&[1, 2]))],
    );
    let a = DecodedBallot::new().with_question(1, &[(1, 1)]);
    let b = DecodedBallot::new().with_question(1, &[(2, 1)]);

    let records = encode_all(&e, &[a.clone(), a.clone(), b.clone()]);
    let result = tally_records(&e, &records).unwrap();
    assert_eq!(plurality_rows(&result, 1), vec![(1, 2, 1), (2, 1, 2)]);

    let records = encode_all(&e, &[a, b]);
    let result = tally_records(&e, &records).unwrap();
    assert_eq!(plurality_rows(&result, 1), vec![(1, 1, 1), (2, 1, 1)]);
}

#[test]
fn condorcet_winner_ranks_first() {
    init_logs();
    let e = election(
        BallotType::Preferential,
        TallyType::Schulze,
        vec![Question::new(1, options(&[1, 2, 3, 4]))],
    );
    // Option 3 beats every other option head to head, without a majority of first ranks.
    let mut ballots = Vec::new();
    for _ in 0..4 {
        ballots.push(
            DecodedBallot::new().with_question(1, &[(1, 1), (3, 2), (2, 3), (4, UNRANKED)]),
        );
    }
    for _ in 0..3 {
        ballots.push(DecodedBallot::new().with_question(1, &[(2, 1), (3, 2), (1, 3), (4, 4)]));
    }
    for _ in 0..2 {
        ballots.push(DecodedBallot::new().with_question(1, &[(3, 1), (2, 2), (1, 3), (4, 4)]));
    }
    let records = encode_all(&e, &ballots);
    let result = tally_records(&e, &records).unwrap();
    match &result.questions[&1] {
        QuestionResult::Schulze(r) => {
            assert_eq!(r.ranking[0], RankedOption { option_id: 3, rank: 1 });
            assert_eq!(r.ranking[3].option_id, 4);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn histogram_with_comments() {
    init_logs();
    let e = election(
        BallotType::RadioRangeComment,
        TallyType::HistogramRange,
        vec![Question::new(1, options(&[1, 2])).with_score_range(1, 5)],
    );
    let ballots = vec![
        DecodedBallot::new()
            .with_question(1, &[(1, 5), (2, 1)])
            .with_comment("Très bien--/2/ok", "Very good--/2/ok"),
        DecodedBallot::new()
            .with_question(1, &[(1, 4), (2, 2)])
            .with_comment("", ""),
    ];
    let records = encode_all(&e, &ballots);
    let result = tally_records(&e, &records).unwrap();
    assert_eq!(result.ballots, 2);
    assert_eq!(result.comments.len(), 2);
    assert_eq!(result.comments[0].native, "Très bien--/2/ok");
    match &result.questions[&1] {
        QuestionResult::HistogramRange(r) => {
            assert_eq!(r.rows[0].option_id, 1);
            assert_eq!(r.rows[0].average, Some(4.5));
            assert_eq!(r.rows[1].average, Some(1.5));
            assert_eq!(r.rows[0].bins.len(), 5);
        }
        other => panic!("unexpected result {:?}", other),
    }
    let text = result.render_text(&e);
    assert!(text.contains("average 4.500 over 2 votes"));
    assert!(text.contains("Comments (2)"));
}

fn stv_run() -> ElectionResult {
    let e = election(
        BallotType::Stv,
        TallyType::Stv,
        vec![Question::new(1, options(&[1, 2, 3, 4, 5])).with_seats(3)],
    );
    let rankings: Vec<(usize, Vec<(OptionId, Score)>)> = vec![
        (11, vec![(1, 0), (2, 1), (3, 2)]),
        (7, vec![(2, 0), (5, 1)]),
        (5, vec![(3, 0), (1, 1), (4, 2), (5, 3)]),
        (4, vec![(4, 0), (3, 1)]),
        (3, vec![(5, 0)]),
        (1, vec![]),
    ];
    let mut ballots = Vec::new();
    for (count, ranking) in rankings.iter() {
        for _ in 0..*count {
            ballots.push(DecodedBallot::new().with_question(1, ranking));
        }
    }
    let records = encode_all(&e, &ballots);
    tally_records(&e, &records).unwrap()
}

#[test]
fn stv_results_are_deterministic() {
    init_logs();
    let first = stv_run();
    let second = stv_run();
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    assert_eq!(first.digest().unwrap(), second.digest().unwrap());
    match &first.questions[&1] {
        QuestionResult::Stv(r) => {
            assert_eq!(r.ballots, 31);
            assert_eq!(r.elected.len(), 3);
            assert!(r.rounds.len() < MAX_ROUNDS as usize);
            for round in r.rounds.iter() {
                for c in round.tally.iter() {
                    assert!((0.0..=1.0).contains(&c.keep_factor));
                }
            }
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn results_survive_a_json_round_trip() {
    let result = stv_run();
    let json = result.to_json().unwrap();
    let back: ElectionResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
    assert_eq!(back.digest().unwrap(), result.digest().unwrap());
}

#[test]
fn aborted_runs_stay_aborted() {
    init_logs();
    let e = election(
        BallotType::Approval,
        TallyType::Plurality,
        vec![Question::new(1, options(&[1, 2]))],
    );
    let mut tallier = ElectionTallier::new(&e).unwrap();
    let good = tallier
        .codec()
        .encode(&DecodedBallot::new().with_question(1, &[(1, 1), (2, 0)]))
        .unwrap();
    tallier.add_record(&good).unwrap();
    let truncated = &good[..good.len() - 23];
    assert_eq!(
        tallier.add_record(truncated),
        Err(TallyError::MalformedRecord {
            record_index: 1,
            source: DecodeError::GroupCountMismatch {
                question_id: 1,
                expected: 2,
                found: 1
            }
        })
    );
    assert_eq!(tallier.add_record(&good), Err(TallyError::RunAborted));
    assert_eq!(tallier.finish_tally(), Err(TallyError::RunAborted));
    assert_eq!(tallier.ballots(), 1);
}
