/// Revision of the prompt templates below. Bump when the wording or the requested JSON shape
/// changes.
pub const PROMPT_VERSION: &str = "sourcebook_v2";

/// Number of cards requested per generation.
pub const CARDS_PER_OUTCOME: usize = 10;

/// Build the card generation prompt. The outcome is embedded verbatim.
pub fn generation_prompt(outcome: &str) -> String {
    // Keep the contract explicit:
    // - Exactly ten cards, each tied to the outcome.
    // - Core material is an image lookup hint (English keyword) plus caption and source.
    // - At most three search cues.
    // - JSON object with a "cards" array, optionally fenced as ```json.
    format!(
        r#"You are an instructional designer who follows the Understanding by Design principles.

## Your task
Analyze the Learning Outcome below and create {CARDS_PER_OUTCOME} Sourcebook cards that help learners reach it.

## Learning Outcome:
{outcome}

## Core principles
1) Every card MUST connect directly to the Learning Outcome above. Do not include unrelated topics.
2) A card is not knowledge but a coordinate pointing toward knowledge: give learners the minimum cues they need to explore on their own.
3) Each card must cover a different aspect of the Learning Outcome (no duplicates).

## Card design process
Follow these steps for every card:

Step 1: Extract the key concept
- Identify the knowledge, skills and attitudes the outcome requires.

Step 2: Choose the core material (primary evidence)
- Pick a historical or real-world case that demonstrates the concept.
- Choose a concrete person, event, artifact or tool that can be found on Wikimedia Commons.
- Write imageSearchKeyword in English and include specific proper nouns (for example "Alexander Graham Bell telephone 1876", "DNA double helix Watson Crick").

Step 3: Design the essential question
- Ask a question that provokes sustained inquiry rather than simple lookup.
- The question must connect the core material with the Learning Outcome.
- "Why?", "How?" and "What if?" forms work well.

Step 4: Design the search cues
- Provide at most 3 concrete search cues for deeper exploration.
- Include key terms, related theories or paper titles, and archives or references.

## Response format
Respond with JSON only, in exactly this shape:
```json
{{
  "cards": [
    {{
      "id": 1,
      "title": "Card title",
      "coreImage": {{
        "imageSearchKeyword": "English search keyword with specific names",
        "source": "Wikimedia Commons",
        "caption": "One-line description"
      }},
      "essentialQuestion": "Essential question",
      "searchCues": ["cue 1", "cue 2", "cue 3"]
    }}
  ]
}}
```

Create {CARDS_PER_OUTCOME} cards now.
"#
    )
}

/// Build the outcome refinement prompt. The draft is embedded verbatim.
pub fn refinement_prompt(draft: &str) -> String {
    format!(
        r#"You are an instructional designer experienced in writing observable learning outcomes.
Analyze the user's draft Learning Outcome and make it more concrete so it produces better Sourcebook cards.

## User draft:
{draft}

## Five principles for writing outcomes

### 1. Observable
- Avoid verbs that only happen in the learner's head, such as "understand" or "know".
- Use observable action verbs:
  - "can compare ... and explain the difference"
  - "can propose an alternative that applies ... in the situation ..."
  - "can analyze cases of ... and derive the principle of ..."

### 2. Single focus
- One outcome sentence carries one core action.
- Do not list several actions ("design A, test B and analyze C").
- If the draft mixes several actions, merge them around the most important one or split them into 2-3 independent sentences.

### 3. Context & condition
- State the situation or condition in which the action is performed.
- Without context the scope becomes unbounded.
  - Weak: "can analyze data"
  - Strong: "can analyze churn patterns in a given log of user behavior"

### 4. Scope boundary
- Name the subtopics, key terms and objects of observation implied by the draft.
- Narrow overly broad topics to 2-3 core areas.

### 5. Cognitive level
- Use a verb at an appropriate level of Bloom's Taxonomy:
  - Foundational: list, identify, describe
  - Intermediate: compare, classify, apply
  - Advanced: analyze, evaluate, design
- Judge the right level from the context of the draft.

## Rules
- Stay within the original intent of the draft. Do not add unrelated topics.
- If the draft is already concrete, change it only slightly.
- Write in the same language as the draft.
- Refine only the outcome; do not add long-term impact statements.

## Response format
Respond with JSON only, in exactly this shape:
{{"refined": "Refined outcome text (2-4 sentences reflecting the five principles)", "changes": "One line describing what was strengthened, with the principle numbers applied, e.g. [1,3,4] Observable + context + scope"}}
"#
    )
}
