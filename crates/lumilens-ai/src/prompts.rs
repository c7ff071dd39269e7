//! Fixed stage instructions.
//!
//! Each constant is sent as the system message; the variable inputs (document
//! text, Q&A, extracted lists) go in the user message built by the stage.

pub const PRE_APPEAL_REDACTION: &str = "\
The document in the user message is a court or Board decision, order, or dismissal. \
Produce a new version containing only the content that existed before the appeal was filed.

Keep the original content exactly as written: formatting, names, dates, quotations, and structure. \
Do not rewrite, summarise, or paraphrase anything that remains.

Remove only content in these categories:
- Legal reasoning, analysis, findings, or citations by the Board or court
- Procedural history or developments after the appeal was filed
- Statements, footnotes, or narrative from the Board describing or resolving the appeal
- Any label, heading, or caption stating the result of the appeal or of motions decided during it, \
for example \"DENIED: [date]\", \"DISMISSED WITH PREJUDICE: [date]\", \"GRANTED IN PART: [date]\", \
or any similar disposition caption
- Any content introduced during or after litigation

The result must read as a complete, self-contained document that existed before litigation: \
the parties' claims, the contracting officer's actions and decisions, and related correspondence.

Output only the document. No commentary or notes to the reader.";

pub const REASONING_QA: &str = "\
The document in the user message describes a contract claim before any appeal or court decision. \
Answer the questions below as a court or Board evaluating the case would.

For each item, repeat the full question, then give the answer directly beneath it. \
No introduction, summary, or closing remarks.

1. Does this court have proper jurisdiction of the parties and the subject matter of the case, and if so, why?
2. What is the procedural posture of the case? If this is an appeal from a lower court, what did that court decide, and which litigant is appealing?
3. What is the basis for the appeal? What does the appellant claim the lower court decided wrongly (for instance, excluded key evidence or misinterpreted applicable law)?
4. What other procedural grounds exist to dismiss the case or to remand it for a revised hearing and decision?
5. What facts were introduced in the case? Which are undisputed and which are disputed?
6. What claims or causes of action were brought and argued by the litigants?
7. What substantive law actually applies to the facts of this case?
8. How have prior courts dealt with the procedural and substantive issues?
9. Would there be urgency or another reason to issue a temporary injunction or order if the case proceeded?
10. On which issues of fact or law would the court likely ask the parties to submit briefs?
11. What facts, law, and precedent would the court likely cite if it decided on the current record?";

pub const FACTS_EXTRACTION: &str = "\
You will receive the text of a document describing the factual and procedural history of a dispute \
before any court or Board decision, and a structured Q&A with preliminary legal reasoning about it.

Extract the factual assertions in the document that could matter to how a court later evaluates the case. \
Quote facts only from the document text; use the Q&A to understand how facts may be framed, interpreted, or contested.

Return a valid JSON object with exactly this structure:
{
  \"facts\": [
    {
      \"id\": int,
      \"specific_fact_cited\": string,
      \"relevancy_reason\": string,
      \"contestability_reason\": string
    }
  ]
}

Where:
- \"id\": zero-based position of the fact in the document, starting at 0 and increasing by 1
- \"specific_fact_cited\": the sentence copied verbatim from the document
- \"relevancy_reason\": how the fact could bear on jurisdiction, procedural posture, responsibility, or any legal issue the court may address
- \"contestability_reason\": why the fact might be challenged, dismissed, or considered immaterial; empty string if clearly reliable and material

Guidelines:
- Include contract terms, communications, suspensions, delays, modifications, claim amounts, procedural actions, and allegations by any party.
- Do not judge importance; explain possible relevance or contestability in the fields above.
- Facts only: no legal conclusions, citations, or rules.
- Return only the JSON object.";

pub const PROCEDURAL_RULES_EXTRACTION: &str = "\
You will receive the text of a document describing the procedural and factual history of a case \
before a court or Board decision, and a structured Q&A summarising its background and legal context.

Extract the procedural rules, requirements, or practices cited, implied, or suggested by the parties \
or the contracting officer, especially those that could matter if the case were appealed. \
Quote procedural content only from the document itself.

Return a valid JSON object with exactly this structure:
{
  \"rules\": [
    {
      \"procedural_rule\": string,
      \"effects\": string
    }
  ]
}

Where:
- \"procedural_rule\": the procedural rule, doctrine, or principle that could shape how the claim is handled before or during appeal, quoted where possible
- \"effects\": how the rule could influence the handling, outcome, or viability of the case on later review

Guidelines:
- Include only rules about how the claim was filed, evaluated, or handled before an appeal.
- DO include documentation requirements, certification standards, claim format requirements, deadlines, jurisdictional prerequisites, and contracting officer duties.
- DO NOT include substantive doctrines or entitlement standards such as the Eichleay formula or FAR economic adjustment clauses.
- Return only the JSON object.";

pub const PROCEDURAL_REFINEMENT: &str = "\
The user message is a JSON list of rules or doctrines mentioned in a pre-appeal document \
such as a claim, denial, or related correspondence.

Remove every rule that is substantive (what legal rights or entitlements the parties have) and keep \
only the procedural ones (how the claim is processed, reviewed, or evaluated before any appeal).

Keep rules about:
- Jurisdiction or authority of the contracting officer
- Requirements for submitting a claim (certification, format, deadlines)
- What constitutes a valid claim under the Disputes clause
- Documentation or evidentiary requirements for initial claim review
- Procedures for modifying a contract or issuing a termination
- Timeliness or sufficiency of communications between parties
- Administrative steps required before appeal, such as issuing a final decision

Remove rules about:
- Legal tests for entitlement to damages or equitable adjustment
- Standards for suspension, delay, or standby compensation
- Contract doctrines such as constructive suspension or differing site conditions
- The Eichleay formula or any other damages computation
- Interpretations of contract clauses that determine substantive rights

Copy every kept rule unchanged, including its id. Do not add, merge, or reword rules.

Return a valid JSON object with exactly this structure:
{
  \"rules\": [
    {
      \"id\": int,
      \"procedural_rule\": string,
      \"effects\": string
    }
  ]
}";

pub const SUBSTANTIVE_RULES_EXTRACTION: &str = "\
You will receive the text of a document describing the factual and procedural history of a dispute \
before any formal appeal ruling, and a structured Q&A summarising legal theories, issues, and potential claims.

Extract every reference to a substantive rule of law or contract principle cited, implied, or suggested \
by the claimant or the contracting officer, especially those that could matter if a court or Board reviewed \
the dispute. Use the Q&A to see how the parties frame the law, but take principles from the document itself.

Return a valid JSON object with exactly this structure:
{
  \"rules\": [
    {
      \"substantive_law\": string,
      \"applicability\": string,
      \"relevance\": string
    }
  ]
}

Where:
- \"substantive_law\": a concise statement of the rule, clause, or doctrine (e.g. \"Suspension of Work clause\", \"Constructive Suspension Doctrine\", \"Eichleay Formula\")
- \"applicability\": the events or allegations in the document that could make the principle apply
- \"relevance\": how the principle could affect the outcome if a court or Board analysed it

Guidelines:
- Focus on rules governing rights, obligations, or entitlement to compensation under contract or law.
- DO include FAR clauses, contract doctrines (changes, delays, latent conditions), and damages formulas.
- DO NOT include procedural handling or summary judgment standards.
- Return only the JSON object.";

pub const ADMISSIBILITY_SCORING: &str = "\
You will receive:
1. Procedural rules extracted from a pre-appeal document, each with an integer id
2. Facts from the same document
3. A Q&A summarising the legal reasoning relevant to the claim

Score every procedural rule for admissibility: how likely it is to be invoked, relied on, or contested \
in later litigation or appeal. Give each criterion an integer from 0 (low) to 5 (high):

- doctrinal_fit: does the rule align with known procedural doctrines in federal contract disputes?
- fact_match: how well do the facts support or trigger this rule?
- party_assertion: has either party clearly invoked, referenced, or implied this rule?
- precedent_alignment: does the rule align with how similar cases have been handled?

Add a short rationale for each rule. Score every rule exactly once, copy its id into \"rule_id\", \
and copy its text unchanged into \"procedural_rule\".

Return a valid JSON object with exactly this structure:
{
  \"scores\": [
    {
      \"rule_id\": int,
      \"procedural_rule\": string,
      \"doctrinal_fit\": int,
      \"fact_match\": int,
      \"party_assertion\": int,
      \"precedent_alignment\": int,
      \"rationale\": string
    }
  ]
}";

pub const RELEVANCE_SCORING: &str = "\
You will receive:
1. Substantive rules (legal or contractual doctrines) extracted from a pre-appeal document, each with an integer id
2. Facts from the same document
3. A Q&A summarising the legal reasoning relevant to the claim

Score every substantive rule for relevance: how likely it is to shape the legal outcome if the case \
proceeds to appeal. Give each criterion an integer from 0 (low) to 5 (high):

- doctrinal_fit: how directly the rule aligns with legal standards or entitlements under federal contract law
- fact_match: how far the factual record supports applying the rule
- party_assertion: whether either party referenced, relied on, or disputed the rule before the appeal
- precedent_alignment: how consistently courts or boards have treated the rule in analogous contexts

Add a short rationale for each rule. Score every rule exactly once, copy its id into \"rule_id\", \
and copy its text unchanged into \"substantive_law\".

Return a valid JSON object with exactly this structure:
{
  \"scores\": [
    {
      \"rule_id\": int,
      \"substantive_law\": string,
      \"doctrinal_fit\": int,
      \"fact_match\": int,
      \"party_assertion\": int,
      \"precedent_alignment\": int,
      \"rationale\": string
    }
  ]
}";
