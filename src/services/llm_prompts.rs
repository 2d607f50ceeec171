//! Prompt text for every LLM call. Builders are pure so they can be unit tested.

use crate::models::job_description::ParsedJobDescription;
use crate::models::question::QuestionCategory;
use crate::models::resume::ParsedResume;
use crate::services::llm_service::{EvaluationContext, QuestionContext};

pub struct Prompt {
    pub system: String,
    pub user: String,
}

fn category_focus(category: QuestionCategory) -> &'static str {
    match category {
        QuestionCategory::Technical => {
            "Generate technical questions that assess:
- Practical knowledge and coding ability
- Framework and technology understanding
- Problem solving
- Code quality and best practices
- System design"
        }
        QuestionCategory::Conceptual => {
            "Generate conceptual questions that assess:
- Theoretical understanding
- Architectural concepts
- Design patterns and principles
- Technology trade-offs
- Fundamentals"
        }
        QuestionCategory::Behavioral => {
            "Generate behavioral questions that assess:
- Approach to problems
- Team collaboration
- Leadership
- Conflict resolution
- Communication"
        }
        QuestionCategory::Scenario => {
            "Generate scenario-based questions that assess:
- Applying knowledge to a concrete situation
- Real-world problem solving
- Decisions under pressure
- Prioritisation
- Customer and user focus"
        }
    }
}

fn evaluation_rubric(category: QuestionCategory) -> &'static str {
    match category {
        QuestionCategory::Technical => {
            "Evaluate technical answers on:
- Accuracy (30%): correct terminology, concepts and facts
- Clarity (20%): clear communication of technical ideas
- Depth (25%): practical understanding, code quality, best practices
- Relevance (15%): alignment with the question asked"
        }
        QuestionCategory::Conceptual => {
            "Evaluate conceptual answers on:
- Accuracy (30%): correct theoretical understanding
- Clarity (20%): clear explanation of concepts
- Depth (25%): grasp of underlying principles
- Relevance (15%): alignment with the question asked"
        }
        QuestionCategory::Behavioral => {
            "Evaluate behavioral answers on:
- Accuracy (30%): use of the STAR method (Situation, Task, Action, Result)
- Clarity (20%): communication clarity
- Depth (25%): specific examples and self-awareness
- Relevance (15%): alignment with the question asked"
        }
        QuestionCategory::Scenario => {
            "Evaluate scenario answers on:
- Accuracy (30%): an appropriate solution to the scenario
- Clarity (20%): clear explanation of the approach
- Depth (25%): alternatives and trade-offs considered
- Relevance (15%): alignment with the scenario"
        }
    }
}

pub fn question_prompt(ctx: &QuestionContext) -> Prompt {
    let level = ctx.jd_experience_level.as_str();
    let difficulty = ctx.difficulty.as_str();
    let category = ctx.category.as_str();

    let system = format!(
        "You are an expert interviewer for {level} level positions.
Generate focused, relevant interview questions that assess candidate capabilities.

{focus}

Rules:
1. Return ONLY the question text, nothing else
2. The question must suit {difficulty} difficulty
3. The question must align with the required skills and the candidate's background
4. The question must be answerable within the time limit
5. Never repeat a previously asked question",
        focus = category_focus(ctx.category),
    );

    let average = ctx
        .average_previous_score
        .map(|s| format!("{:.1}", s))
        .unwrap_or_else(|| "N/A".to_string());

    let user = format!(
        "Generate ONE {category} interview question at {difficulty} difficulty.

Candidate Skills: {skills}
Candidate Experience: {experience}
Job Requirements: {requirements}
Required Skills: {required}
Experience Level: {level}
Previous Questions: {previous}
Average Previous Score: {average}",
        skills = ctx.candidate_skills.join(", "),
        experience = ctx.candidate_experience.join("; "),
        requirements = ctx.jd_requirements.join("; "),
        required = ctx.jd_skills_required.join(", "),
        previous = ctx.previous_questions.join(" | "),
    );

    Prompt { system, user }
}

pub fn evaluation_prompt(ctx: &EvaluationContext) -> Prompt {
    let system = format!(
        "You are an expert interview evaluator. Score each criterion from 0 to 100.

{rubric}

Return ONLY this JSON object:
{{
  \"accuracy\": <number 0-100>,
  \"clarity\": <number 0-100>,
  \"depth\": <number 0-100>,
  \"relevance\": <number 0-100>,
  \"feedback\": \"<detailed feedback>\",
  \"strengths\": [\"...\"],
  \"improvements\": [\"...\"]
}}",
        rubric = evaluation_rubric(ctx.category),
    );

    let user = format!(
        "Question: {question}
Difficulty: {difficulty}
Category: {category}

Candidate Answer:
\"{answer}\"

Time Taken: {taken}s / {limit}s

Candidate Skills: {skills}
Required Skills: {required}",
        question = ctx.question_text,
        difficulty = ctx.difficulty.as_str(),
        category = ctx.category.as_str(),
        answer = ctx.answer_text,
        taken = ctx.time_taken,
        limit = ctx.time_limit,
        skills = ctx.candidate_skills.join(", "),
        required = ctx.jd_skills_required.join(", "),
    );

    Prompt { system, user }
}

pub fn resume_prompt(resume_text: &str) -> Prompt {
    let system = r#"You are an expert resume parser. Extract structured information from the resume.
Return ONLY valid JSON with this shape:
{
  "skills": ["..."],
  "experience": [{"company": "", "role": "", "duration": "", "description": ["..."]}],
  "projects": [{"name": "", "description": "", "technologies": ["..."], "role": ""}],
  "education": [{"institution": "", "degree": "", "field": "", "year": ""}],
  "certifications": ["..."]
}
Use empty arrays for anything not found."#
        .to_string();

    Prompt {
        system,
        user: format!("Parse this resume:\n\n{}", resume_text),
    }
}

pub fn job_description_prompt(jd_text: &str) -> Prompt {
    let system = r#"You are an expert job description parser. Extract structured information from the job description.
Return ONLY valid JSON with this shape:
{
  "title": "",
  "requirements": ["..."],
  "skills_required": ["..."],
  "experience_level": "Entry" | "Mid" | "Senior" | "Lead",
  "responsibilities": ["..."],
  "key_competencies": ["..."]
}
Infer the experience level from the content. Use empty arrays for anything not found."#
        .to_string();

    Prompt {
        system,
        user: format!("Parse this job description:\n\n{}", jd_text),
    }
}

pub fn fit_prompt(resume: &ParsedResume, jd: &ParsedJobDescription) -> Prompt {
    let system = "You are an expert recruiter. Evaluate candidate fit for a position.
Return ONLY a number from 0 to 100.
Consider skills match, experience level, project relevance and education."
        .to_string();

    let experience: Vec<String> = resume
        .experience
        .iter()
        .map(|e| format!("{} at {}", e.role, e.company))
        .collect();
    let education: Vec<String> = resume
        .education
        .iter()
        .map(|e| format!("{} in {} from {}", e.degree, e.field, e.institution))
        .collect();

    let user = format!(
        "Resume:
Skills: {skills}
Experience: {experience}
Education: {education}

Job Description:
Title: {title}
Required Skills: {required}
Experience Level: {level}
Key Responsibilities: {responsibilities}

Return the fit score as a single number.",
        skills = resume.skills.join(", "),
        experience = experience.join(", "),
        education = education.join(", "),
        title = jd.title,
        required = jd.skills_required.join(", "),
        level = jd.experience_level.as_str(),
        responsibilities = jd.responsibilities.join("; "),
    );

    Prompt { system, user }
}
