/*!

This is the long-form manual for `likert_aggregate` and `likertstat`.

## Input

A questionnaire export: the first row is the header, the first column holds the
respondent identifier and every other column is a question. Each cell contains
the answer as free text. Question names must be unique.

The following formats are supported by `likertstat`:
* `csv` Delimited text. The delimiter (`,` `;` tab or `|`) is detected from the
  header line. Files that are not valid UTF-8 are read as Latin-1.
* `xlsx` Excel workbooks. The worksheet can be chosen with `--excel-worksheet-name`,
  otherwise the workbook must contain a single worksheet.

Cells that are empty or that do not match any label of the scale are dropped.
They are not an error: they only lower the number of observations.

## Scales

A scale is an ordered list of labels. Each label has a code, an ordinal score,
a sentiment (positive, neutral, negative) and a list of synonyms. Matching is
done on the trimmed, lowercase text of the cell, against the code and the synonyms.

Two scales are built in. They are not compatible and are never mixed:

| code | `five_point` | `six_point` | synonym |
|------|-----|-----|---------|
| STS  | 1 (negative) | 1 (negative) | sangat tidak setuju |
| TS   | 2 (negative) | 2 (negative) | tidak setuju |
| CTS  | - | 3 (negative) | cukup tidak setuju |
| CS   | 3 (neutral) | 4 (neutral) | cukup setuju |
| S    | 4 (positive) | 5 (positive) | setuju |
| SS   | 5 (positive) | 6 (positive) | sangat setuju |

Custom scales can be declared in the configuration file:

```json
{
  "scale": {
    "name": "agreement",
    "labels": [
      { "code": "D", "ordinal": 1, "sentiment": "negative", "synonyms": ["disagree"] },
      { "code": "N", "ordinal": 2, "sentiment": "neutral", "synonyms": ["neutral"] },
      { "code": "A", "ordinal": 3, "sentiment": "positive", "synonyms": ["agree"] }
    ]
  }
}
```

## Statistics

Two denominators are used, and they are not interchangeable:
* global shares (label counts, answer rate, sentiment split) divide by the number
  of valid answers;
* per-question shares (question rate, top question of a label, rate report)
  divide by the number of respondents, including those whose answer was dropped.

Percentages are rounded to 1 decimal and means to 2 decimals. Exact ties go to the even
neighbour (1 answer out of 16 is 6.2 %, a mean of 3.125 is 3.12).
The sentiment percentages are rounded separately, so they may add up to 99.9 or 100.1.

Ties are always resolved in declaration order: the scale order for labels and the
column order for questions. A label that never appears is not a candidate for the
least common label.

When no cell could be normalized, every statistic reports
[`AggregateErrors::NoValidData`](crate::AggregateErrors::NoValidData).

## Scoring queries

`likertstat --query <code>` prints a single line instead of the JSON summary:

| code | output |
|------|--------|
| `q1`  | most common label: `label|count|percent` |
| `q2`  | least common label: `label|count|percent` |
| `q3`..`q8` | question with the most SS, S, CS, CTS, TS, STS: `question|count|percent` |
| `q9`  | STS rate per question: `question:percent|...` |
| `q10` | mean score |
| `q11` | best question: `question:mean` |
| `q12` | worst question: `question:mean` |
| `q13` | `positif=count:percent|netral=count:percent|negatif=count:percent` |

`q6` only makes sense with the `six_point` scale.

*/
