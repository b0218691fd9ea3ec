//! Fixed instruction templates for the three pipeline stages.

pub const ANALYSIS_PROMPT: &str = r#"Identify whether the following Reddit discussion surfaces either:
- a *viable* software problem (a pain point that could be solved with software),
- or a business opportunity (an approach, product, or service that is working, being paid for, or could be replicated).

Consider a post viable if it describes a problem, a need, a workaround, a paid solution, or a business opportunity, even if the problem is not fully described or if the market is niche. Be generous in your assessment.

Return JSON:
- is_viable: boolean
- is_opportunity: boolean  # true if a business opportunity is present
- problem_description      # or opportunity description
- target_market
- confidence_score (0-1)

TEXT
----
{content}
"#;

pub const SOLUTION_PROMPT: &str = r#"You are a senior software architect and business analyst.

**Constraints**
- If the post describes a problem, propose a software solution.
- If the post describes a business opportunity, propose how to replicate or address that opportunity with a new product, service, or SaaS.
- Provide 1-3 features *specific* to the problem, need, or opportunity & target market.
- Explicitly DO NOT propose a generic CRUD task manager / kanban / to-do app.
- MVP should be buildable in about 2 weeks.

Problem or Opportunity
----------------------
{problem}

Target market
-------------
{market}

Context excerpt (for specificity)
---------------------------------
{context}

Return JSON:
- solution_description
- tech_stack              (array)
- mvp_features            (array, max 3)
- est_development_time
"#;

pub const PLAYBOOK_PROMPT: &str = r#"You are pair-programming inside **Cursor**.

Create an ordered list of prompts the developer can paste into Cursor, one by
one, to build the MVP below. Each prompt can build off of the previous one.

### Required sequence
0. **Context prompt** - Explain the problem, target market, and the chosen MVP
   in 120 words or fewer. Finish with:
   "Respond 'Ready' if you understand and will wait for detailed tasks."

1. **Project bootstrap**
   * Git repo init, README stub, MIT license
   * Basic tooling: lint / format / .env.example

2. **Data model & schema** - full schema with migrations (e.g. Prisma, Alembic,
   or Mongoose).

3. **Core backend logic & endpoints** - implement the 1-3 MVP features with
   unit-test stubs.

4. **Minimal UI or CLI** - only what is needed to demo the features locally.

5. **Automated tests** - unit + one happy-path integration test.

6. **Local run instructions** - how to start the dev server, seed sample data,
   and test the flow.

Problem
-------
{problem}

Target market
-------------
{market}

Chosen solution
---------------
{solution}

Return JSON only with one key `prompts` whose value is the array of prompt
strings.
"#;

pub fn judgment_prompt(content: &str) -> String {
    ANALYSIS_PROMPT.replace("{content}", content)
}

pub fn solution_prompt(problem: &str, market: &str, context: &str) -> String {
    SOLUTION_PROMPT
        .replace("{problem}", problem)
        .replace("{market}", market)
        .replace("{context}", context)
}

pub fn playbook_prompt(problem: &str, market: &str, solution: &str) -> String {
    PLAYBOOK_PROMPT
        .replace("{problem}", problem)
        .replace("{market}", market)
        .replace("{solution}", solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn judgment_prompt_embeds_content() {
        let prompt = judgment_prompt("some post text");
        assert!(prompt.contains("some post text"));
        assert!(!prompt.contains("{content}"));
    }

    #[test]
    fn solution_prompt_fills_all_placeholders() {
        let prompt = solution_prompt("the problem", "the market", "the context");
        assert!(prompt.contains("the problem"));
        assert!(prompt.contains("the market"));
        assert!(prompt.contains("the context"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn playbook_prompt_keeps_the_seven_step_scaffold() {
        let prompt = playbook_prompt("p", "m", "s");
        for step in [
            "Context prompt",
            "Project bootstrap",
            "Data model & schema",
            "Core backend logic",
            "Minimal UI or CLI",
            "Automated tests",
            "Local run instructions",
        ] {
            assert!(prompt.contains(step), "missing step: {step}");
        }
    }
}
