/*!

This is the long-form manual for `poll_tally` and `polltally`.

## Ballot records

A record is the text form of one ballot. It is a sequence of field groups, each
closed by `--`. Question, option and candidate ids are written as 8 upper-case
hexadecimal digits. For the fixed-width ballot types, every record of an election
has the same length whatever the voter chose.

| ballot type           | group                              | width |
|-----------------------|------------------------------------|-------|
| `approval`            | `Q{qid}-A{oid}-{y,n}--`            | 23    |
| `choose`              | `Q{qid}-A{oid}--`                  | 21    |
| `preferential`        | `Q{qid}-A{oid}-R{rank}--`          | 31    |
| `radio-range`         | `Q{qid}-A{oid}-{+/-}{10 digits}--` | 33    |
| `radio-range-comment` | as `radio-range`, then a comment   |       |
| `stv`                 | `Q{qid}-C{cid}-R{position}--`      | 31    |

### `approval`

One group per option of every question, in election order. `y` approves the
option and `n` does not.

```text
Q00000001-A00000001-y--Q00000001-A00000002-n--
```

### `choose`

A single group per question, naming the selected option.

### `preferential`

One group per option. The rank is written in hexadecimal: `1` is the most
preferred and `999` (`R000003E7`) the least. Options the voter left out are
written with rank `1000` (`R000003E8`). Several options may share a rank.

### `radio-range`

One group per option, with a signed score written as `+` or `-` followed by
exactly 10 decimal digits. The score must be within the `minScore` and
`maxScore` of the question. Zero is always written `+0000000000`.

```text
Q00000001-A00000001--0000000002--Q00000001-A00000002-+0000000010--
```

### `radio-range-comment`

The `radio-range` groups, followed by a comment in two parts: the text in the
voter's language and its English translation. Each part is prefixed with its
length in bytes, and the two parts are separated by `--`:

```text
/{len}/{native}--/{len}/{en}
```

The length prefix makes any text possible, including `--` and `/`.

### `stv`

One group per ranked candidate, most preferred first. Positions count from 0 and
must be contiguous. Unranked candidates are absent, so STV records have varying
lengths and an empty record is a valid, empty ballot.

## Tallies

| ballot type           | tally types                    |
|-----------------------|--------------------------------|
| `approval`            | `plurality`                    |
| `choose`              | `plurality`                    |
| `preferential`        | `schulze`                      |
| `radio-range`         | `plurality`, `histogram-range` |
| `radio-range-comment` | `plurality`, `histogram-range` |
| `stv`                 | `stv`                          |

### `plurality`

Sums the scores given to each option. Options are listed by decreasing total and
ranked with competition ranking: tied options share a rank, and the next option
is ranked after all of them (1, 1, 3).

### `histogram-range`

Counts, for each option, how many voters gave each score between the bounds of
the question, and the average score. Options are ranked by decreasing average.
An option nobody scored has no average and is ranked last.

### `schulze`

Counts for every pair of options how many voters ranked one above the other.
The strength of a path between two options is the strength of its weakest link,
where a link is compared by its votes in favour first and its votes against
second. Options that no remaining option beats take the next rank; when every
remaining option is beaten, they all share it.

### `stv`

Meek's method. Every round:
- each ballot starts with a weight of 1, and each candidate on it keeps its keep
  factor's share of the weight still left (1 for hopeful candidates, 0 for
  eliminated ones);
- the quota is `total / (seats + 1) + 0.000001`;
- hopeful candidates reaching the quota are elected, the largest tally first,
  up to the number of open seats;
- the keep factor of each elected candidate becomes `keep * quota / tally`;
- when nobody was elected, the lowest hopefuls are eliminated if the total
  surplus of the elected candidates could not lift them above the next tally.
  If all hopefuls are tied, they are all eliminated. If the surplus stops
  decreasing between such rounds, the lowest hopefuls are eliminated anyway.

The count ends when all seats are filled or nobody is left hopeful. A count that
runs for 10000 rounds fails.

## Configuration

`polltally` reads a JSON configuration:

```text
{
  "outputSettings": {
    "contestName": "Board election",
    "contestDate": "2022-11-08",
    "outputFile": "summary.json"
  },
  "election": {
    "id": 12,
    "ballotType": "stv",
    "tallyType": "stv",
    "questions": [
      {
        "id": 1,
        "options": [{"id": 1, "text": "Alice"}, {"id": 2, "text": "Bob"}],
        "properties": {"seats": 1}
      }
    ]
  },
  "recordSources": [{"provider": "text", "filePath": "records.txt"}]
}
```

Range questions set `minScore` and `maxScore` in their `properties`.

The `text` provider reads one record per line and ignores empty lines. The
`json` provider reads an array of strings, which is needed when comments contain
line breaks. File paths are relative to the configuration file.

 */
