//! Agent roles and their personas

use serde::{Deserialize, Serialize};

/// The generation roles; each is bound to one model by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Strategist,
    Ideator,
    Ghostwriter,
    Reviewer,
    Summarizer,
    Titler,
}

impl AgentRole {
    pub const ALL: [AgentRole; 6] = [
        AgentRole::Strategist,
        AgentRole::Ideator,
        AgentRole::Ghostwriter,
        AgentRole::Reviewer,
        AgentRole::Summarizer,
        AgentRole::Titler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Strategist => "strategist",
            AgentRole::Ideator => "ideator",
            AgentRole::Ghostwriter => "ghostwriter",
            AgentRole::Reviewer => "reviewer",
            AgentRole::Summarizer => "summarizer",
            AgentRole::Titler => "titler",
        }
    }

    pub fn persona(&self) -> Persona {
        match self {
            AgentRole::Strategist => Persona {
                title: "Personal Branding Strategist",
                goal: "Create a tailored content plan to build a user's professional brand for their target career role.",
                backstory: "You are an expert in career branding and content marketing. You analyze a user's background, \
                            skills, and career goals to devise a powerful, actionable content strategy.",
            },
            AgentRole::Ideator => Persona {
                title: "Creative Content Ideator",
                goal: "Generate engaging content ideas based on a strategic plan.",
                backstory: "You're a creative expert in social media content. You turn strategic plans into compelling \
                            post ideas with strong hooks and clear outlines for platforms like LinkedIn and Twitter.",
            },
            AgentRole::Ghostwriter => Persona {
                title: "Professional LinkedIn Ghostwriter",
                goal: "Draft a compelling, professional, and engaging LinkedIn post from a given content idea.",
                backstory: "You are a master of words, specializing in writing for a sophisticated tech and business \
                            audience on LinkedIn. You expand a simple idea into a full post that is clear, concise, and \
                            designed to spark conversation and establish thought leadership.",
            },
            AgentRole::Reviewer => Persona {
                title: "Content Quality Assurance Analyst",
                goal: "Review a drafted LinkedIn post for quality, clarity, tone, and strategic alignment, providing \
                       actionable feedback.",
                backstory: "You are a meticulous editor with an eye for detail. You review a draft, compare it to the \
                            original goal, and give specific, constructive criticism that lifts the post from good to great.",
            },
            AgentRole::Summarizer => Persona {
                title: "Resume Analyst",
                goal: "Summarize a professional's background into a short, accurate profile.",
                backstory: "You are a seasoned career coach who reads resumes quickly and pulls out the experience, \
                            skills, and achievements that matter for personal branding.",
            },
            AgentRole::Titler => Persona {
                title: "Chat Title Generator",
                goal: "Create a concise, 3-5 word title for a branding strategy session.",
                backstory: "You are an assistant skilled at summarizing conversations into short, descriptive titles \
                            for chat history.",
            },
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who the agent is: rendered into the system prompt of every call
#[derive(Debug, Clone, Copy)]
pub struct Persona {
    pub title: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl Persona {
    pub fn system_prompt(&self) -> String {
        format!(
            "You are the {}.\n\nYour goal: {}\n\n{}",
            self.title, self.goal, self.backstory
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_a_persona() {
        for role in AgentRole::ALL {
            let prompt = role.persona().system_prompt();
            assert!(prompt.starts_with("You are the "), "{}", role);
            assert!(prompt.contains("Your goal:"));
        }
    }

    #[test]
    fn test_role_display_and_serde_agree() {
        for role in AgentRole::ALL {
            let json = serde_json::to_value(role).unwrap();
            assert_eq!(json, role.to_string());
        }
    }
}
